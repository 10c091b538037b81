/// NullX presentation scripts: five (image, text) segments per level.

use crate::domain::level::LevelId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Segment {
    pub image: &'static str,
    pub text: &'static str,
}

const fn seg(image: &'static str, text: &'static str) -> Segment {
    Segment { image, text }
}

const EXPLAINING: &str = "NullX_explaining.png";
const SPEAKING: &str = "NullX_speaking.png";
const CHEERING: &str = "NullX_Cheering.png";
const WONDERING: &str = "NullX_Wondering.png";

const LEVEL_1: [Segment; 5] = [
    seg(EXPLAINING, "Hey Agent! NullX here. Ready to dive into Digital Forensics? Your first mission involves 'metadata' - data *about* data."),
    seg(SPEAKING, "Think of it like the label on a file folder. Image files have EXIF data: camera model, date taken, GPS coordinates... juicy stuff!"),
    seg(EXPLAINING, "Why care? Because sometimes this metadata contains hidden clues or comments directly embedded by someone... maybe our target?"),
    seg(SPEAKING, "Real story: Tech personality John McAfee was hiding out. A journalist posted a photo of him online. Oops! The photo's EXIF data still had the GPS coordinates, revealing his location to the world!"),
    seg(SPEAKING, "Metadata matters! Use the 'exif' command on that image file. Find the hidden flag. Click the prompt below when you're ready to proceed!"),
];

const LEVEL_2: [Segment; 5] = [
    seg(EXPLAINING, "Good job finding that metadata! Now, let's look *inside* files, specifically executable programs."),
    seg(EXPLAINING, "Programs are mostly machine code, but often contain readable text snippets called 'strings'. These can be error messages, file paths, URLs, or even accidentally left-in secrets!"),
    seg(SPEAKING, "The 'strings' command scans a file for sequences of readable characters. It's like fishing for plaintext hints in a sea of binary."),
    seg(SPEAKING, "Real world? Malware analysts use 'strings' constantly! They find C&C server addresses, hidden messages from the malware author, or clues about what the program does, all embedded as plain text."),
    seg(CHEERING, "Run 'strings' on that suspicious program file. See what text treasures you uncover! Ready? Click below!"),
];

const LEVEL_3: [Segment; 5] = [
    seg(EXPLAINING, "You're getting good at this! Sometimes, data isn't hidden, just... disguised. Ever seen long gibberish text with letters, numbers, maybe '+' and '/'?"),
    seg(EXPLAINING, "That might be Base64 encoding! It turns binary data into safe-to-transmit text characters. Crucially, it's *not* encryption, just a common way to make data look like plain text. Often ends with '=' padding."),
    seg(SPEAKING, "Phishing attacks love Base64! They encode malicious website links or script commands. A simple text filter might miss 'aHR0cHM6Ly9ldmlsLnNpdGU=', but decoding it reveals 'https://evil.site'!"),
    seg(SPEAKING, "Think of it as a substitution code, not a secret code. We just need the right tool to reverse it."),
    seg(SPEAKING, "Check out that log file. Spot any Base64-looking strings? Use the 'decode64' command! Let's crack it. Click when ready!"),
];

const LEVEL_4: [Segment; 5] = [
    seg(EXPLAINING, "Back to images! But this time, the secret isn't just metadata. We're looking at basic steganography - hiding data *inside* the file itself."),
    seg(EXPLAINING, "There are complex ways, but a simple one is just tacking extra data onto the *end* of a file, after the legitimate image data finishes."),
    seg(SPEAKING, "Image viewers usually ignore extra data after the 'End of Image' marker. So, you could append text, another file, anything! It's hidden unless you know to look past the end."),
    seg(SPEAKING, "Forensic tools, or sometimes simple 'extract' commands, can check for data appended after known file structure markers. It's less common for malware, more for challenges or hiding notes."),
    seg(SPEAKING, "That image... it might have more to it than meets the eye. Try the 'extract' command. See if anything falls out! Ready? Click below!"),
];

const LEVEL_5: [Segment; 5] = [
    seg(EXPLAINING, "Final challenge, Agent! A double-header: encrypted archives and code version history."),
    seg(EXPLAINING, "ZIP files can be password protected. Sometimes, people get lazy and leave hints *in the file's own metadata comment*! Use 'exif' on the zip."),
    seg(SPEAKING, "Then there's Git - used by developers to track code changes. Every save (commit) is logged. If someone commits a password, then removes it later... it's still visible in the 'git log' history!"),
    seg(WONDERING, "This REALLY happens! Massive data leaks have occurred because developers accidentally committed API keys or private credentials to public GitHub repositories and forgot to purge the history."),
    seg(CHEERING, "First, examine the ZIP's metadata for password clues ('exif'). Then use 'unzip'. Once inside, check the note file. Does it have a history? Use 'git log'. Go! Click below!"),
];

// ── Arabic ──

const LEVEL_1_AR: [Segment; 5] = [
    seg(EXPLAINING, "مرحبًا أيها الوكيل! نولكس هنا. مستعد للغوص في التحقيق الجنائي الرقمي؟ مهمتك الأولى تتعلق بـ 'البيانات الوصفية' - البيانات *حول* البيانات."),
    seg(SPEAKING, "فكر فيها مثل الملصق على ملف مجلد. تحتوي ملفات الصور على بيانات EXIF: طراز الكاميرا، تاريخ الالتقاط، إحداثيات GPS... أشياء مثيرة!"),
    seg(EXPLAINING, "لماذا تهتم؟ لأن هذه البيانات الوصفية تحتوي أحيانًا على أدلة مخفية أو تعليقات مدمجة مباشرة من قبل شخص ما... ربما هدفنا؟"),
    seg(SPEAKING, "قصة حقيقية: كان جون ماكافي يختبئ. نشر صحفي صورة له على الإنترنت. خطأ! لا تزال بيانات EXIF للصورة تحتوي على إحداثيات GPS، مما كشف عن موقعه للعالم!"),
    seg(SPEAKING, "البيانات الوصفية مهمة! استخدم الأمر 'exif' على ملف الصورة ذلك. ابحث عن العلم المخفي. انقر على المطالبة أدناه عندما تكون مستعدًا للمتابعة!"),
];

const LEVEL_2_AR: [Segment; 5] = [
    seg(EXPLAINING, "عمل رائع في إيجاد البيانات الوصفية! الآن، دعنا نلقي نظرة *داخل* الملفات، تحديداً البرامج التنفيذية."),
    seg(EXPLAINING, "البرامج تتكون في الغالب من كود الآلة، لكنها غالباً تحتوي على أجزاء نصية قابلة للقراءة تُعرف بـ 'Strings'. ممكن تكون رسائل خطأ، مسارات ملفات، روابط، أو حتى أسرار نُسيت داخلها!"),
    seg(SPEAKING, "أمر 'strings' يقوم بمسح الملف بحثاً عن تسلسلات من الأحرف القابلة للقراءة. كأنه يصطاد نصوص واضحة وسط بحر من البيانات الثنائية."),
    seg(SPEAKING, "في العالم الحقيقي؟ محللو البرمجيات الخبيثة يستخدمونه دائماً! يكتشفون من خلاله عناوين خوادم التحكم، رسائل خفية من مطور البرمجية، أو دلائل على وظيفة البرنامج."),
    seg(CHEERING, "شغل أمر 'strings' على الملف المشبوه. شوف شنو النصوص اللي راح تكتشفها! جاهز؟ اضغط بالأسفل!"),
];

const LEVEL_3_AR: [Segment; 5] = [
    seg(EXPLAINING, "أنت تتحسن بالفعل! أحياناً، لا تكون البيانات مخفية، بل مُموّهة. هل سبق أن رأيت نصاً طويلاً مليئاً بالحروف والأرقام، وربما رمزي '+' و'/'؟"),
    seg(EXPLAINING, "قد يكون هذا ترميز Base64! فهو يحوّل البيانات الثنائية إلى نصوص قابلة للإرسال. ليس تشفيراً، بل وسيلة شائعة لتمثيل البيانات كنص عادي. غالباً ما ينتهي بعلامة '='."),
    seg(SPEAKING, "الهجمات الاحتيالية تعتمد كثيراً على Base64! تُشفَّر الروابط الضارة أو أوامر البرمجة النصية. مرشح النصوص قد يتجاهل 'aHR0cHM6Ly9ldmlsLnNpdGU='، لكن فك الترميز يكشف 'https://evil.site'!"),
    seg(SPEAKING, "فكّر به كرمز تحويل، لا كرمز سري. نحتاج فقط إلى الأداة المناسبة لعكسه."),
    seg(SPEAKING, "افتح ملف السجل. هل ترى سلاسل تشبه Base64؟ استخدم الأمر 'decode64'! هيا نحلها. اضغط عندما تكون جاهزاً!"),
];

const LEVEL_4_AR: [Segment; 5] = [
    seg(EXPLAINING, "عدنا إلى الصور! لكن هذه المرة، السر ليس في البيانات الوصفية فقط. نحن نبحث عن إخفاء البيانات داخل الملف نفسه."),
    seg(EXPLAINING, "بعض الطرق معقّدة، لكن الطريقة البسيطة هي إضافة بيانات جديدة بعد نهاية بيانات الصورة الأصلية."),
    seg(SPEAKING, "برامج عرض الصور تتجاهل عادةً أي بيانات بعد علامة نهاية الصورة. لذا يمكن إلحاق نص أو ملف آخر أو أي شيء. سيبقى مخفياً ما لم يبحث أحد خلف النهاية."),
    seg(SPEAKING, "أدوات التحليل الجنائي، أو بعض أوامر 'extract'، يمكنها فحص البيانات المضافة بعد البنية المعروفة للملف. هذا النوع أقل استخداماً في البرمجيات الخبيثة، وأكثر شيوعاً في التحديات أو إخفاء الملاحظات."),
    seg(SPEAKING, "تلك الصورة... قد تحتوي على ما هو أكثر مما يبدو. جرّب أمر 'extract'. انظر إن كان هناك شيء إضافي! هل أنت مستعد؟ اضغط أدناه!"),
];

const LEVEL_5_AR: [Segment; 5] = [
    seg(EXPLAINING, "التحدي الأخير، أيها العميل! مكون من جزأين: الأرشيفات المشفّرة وتاريخ التعديلات البرمجية."),
    seg(EXPLAINING, "ملفات ZIP يمكن حمايتها بكلمة مرور. أحياناً، يترك البعض تلميحات داخل تعليق الملف نفسه! استخدم الأمر 'exif' على الملف المضغوط."),
    seg(SPEAKING, "ولدينا Git - أداة يستخدمها المطورون لتتبع تغييرات الشيفرة. كل عملية حفظ تُسجّل. إذا تم حفظ كلمة مرور ثم حذفها... ستبقى ظاهرة في سجل 'git log'."),
    seg(WONDERING, "هذا يحدث فعلاً! وقعت تسريبات ضخمة لأن مطورين نسوا إزالة مفاتيح API أو بيانات حساسة من تاريخ Git بعد نشرها."),
    seg(CHEERING, "أولاً، افحص بيانات ZIP باستخدام 'exif' للبحث عن تلميحات كلمة المرور. ثم استخدم 'unzip'. بعد الدخول، تحقق من ملف الملاحظات. هل له تاريخ؟ استخدم 'git log'. انطلق! اضغط أدناه!"),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Language {
    English,
    Arabic,
}

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "ar" => Some(Language::Arabic),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::English => Language::Arabic,
            Language::Arabic => Language::English,
        }
    }
}

/// Script for `level` in `language`, if the level has one.
///
/// Text is stored in logical order; shaping right-to-left text is left to the
/// terminal.
pub fn script_for(level: LevelId, language: Language) -> Option<&'static [Segment]> {
    match (level, language) {
        (1, Language::English) => Some(&LEVEL_1),
        (2, Language::English) => Some(&LEVEL_2),
        (3, Language::English) => Some(&LEVEL_3),
        (4, Language::English) => Some(&LEVEL_4),
        (5, Language::English) => Some(&LEVEL_5),
        (1, Language::Arabic) => Some(&LEVEL_1_AR),
        (2, Language::Arabic) => Some(&LEVEL_2_AR),
        (3, Language::Arabic) => Some(&LEVEL_3_AR),
        (4, Language::Arabic) => Some(&LEVEL_4_AR),
        (5, Language::Arabic) => Some(&LEVEL_5_AR),
        _ => None,
    }
}
