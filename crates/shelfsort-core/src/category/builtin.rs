//! Builtin Category Rules
//!
//! Category rules compiled into the binary, in declaration order.
//! Declaration order is the tie-break order of the scoring engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfsortError};

/// Category id reported when no rule scores high enough.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Default multiplier for rules that do not set one
pub const DEFAULT_RULE_WEIGHT: u32 = 10;

/// Builtin rule table
pub const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        id: "baby-care",
        keywords: &[
            "diaper", "wipes", "cream", "lotion", "oil", "shampoo", "soap", "bath", "grooming",
            "thermometer", "aspirator", "health", "monitor", "safety", "gate", "lock", "potty",
            "training", "step", "stool", "toothbrush", "paste", "nail", "clipper", "حفاضات",
            "مناديل", "كريم", "لوشن", "زيت", "شامبو", "صابون", "استحمام", "عناية",
            "ميزان حرارة", "شفاط", "صحة", "مراقبة", "أمان", "بوابة", "قفل", "بوثي", "تدريب",
            "كرسي", "فرشاة", "عجينة", "مقص", "أظافر", "towel", "washcloth", "sponge", "rinser",
            "tub", "stand", "mat", "visor", "منشفة", "ليفة", "إسفنجة", "حوض", "مسند", "سجادة",
            "قبعة",
        ],
        weak_keywords: &[],
        negative: &["toy", "doll", "clothes", "dress", "block"],
        weight: 10,
    },
    BuiltinRule {
        id: "strollers-gear",
        keywords: &[
            "stroller", "pram", "pushchair", "buggy", "travel system", "bassinet", "carrycot",
            "car seat", "booster", "base", "adapter", "carrier", "wrap", "sling", "backpack",
            "diaper bag", "changing bag", "organizer", "holder", "hook", "footmuff",
            "rain cover", "sunshade", "net", "mosquito", "parasol", "umbrella", "wheel",
            "board", "عربة", "عربية", "مستلزمات", "شنطة", "مقعد سيارة", "كارسيت", "بوستر",
            "قاعدة", "شيالة", "حمالة", "حقيبة", "منظم", "حامل", "خطاف", "غطاء مطر", "ناموسية",
            "شمسية",
        ],
        weak_keywords: &["travel", "outdoor", "walk", "ride"],
        negative: &[],
        weight: 10,
    },
    BuiltinRule {
        id: "feeding",
        keywords: &[
            "bottle", "nipple", "teat", "pacifier", "soother", "dummy", "clip", "holder",
            "breast pump", "nursing", "pad", "shield", "milk", "storage", "bag", "container",
            "formula", "food", "cereal", "snack", "pouch", "puree", "biscuit", "cookie",
            "high chair", "booster seat", "bib", "burp cloth", "placemat", "plate", "bowl",
            "spoon", "fork", "cup", "sippy", "straw", "trainer", "sterilizer", "warmer",
            "blender", "steamer", "processor", "maker", "drying rack", "brush", "cleaning",
            "biberon", "feeding", "رضاعة", "ببرونة", "حلمة", "لهاية", "تيتينا", "مشبك",
            "شفاط ثدي", "صدر", "رضاغة", "حليب", "تخزين", "كيس", "علبة", "طعام", "سيريلاك",
            "وجبة", "بسكويت", "كراسي طعام", "كرسي طعام", "مريلة", "مريول", "طبق", "صحن",
            "زبدية", "ملعقة", "شوكة", "كوب", "كأس", "شفاطة", "معقم", "سخان", "خلاط",
            "محضر طعام", "مجفف", "فرشاة تنظيف",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 10,
    },
    BuiltinRule {
        id: "toys",
        keywords: &[
            "toy", "game", "puzzle", "doll", "action figure", "playset", "building", "block",
            "lego", "soft toy", "plush", "stuffed", "teddy", "bear", "animal", "musical",
            "instrument", "car", "truck", "train", "vehicle", "ball", "activity", "center",
            "gym", "playmat", "walker", "rocker", "bouncer", "swing", "jumper", "sorter",
            "stacker", "rattle", "teether", "bath toy", "water", "sand", "outdoor", "ride-on",
            "bike", "trike", "scooter", "skate", "helmet", "pad", "battery", "remote", "لعبة",
            "ألعاب", "بازل", "دمية", "عروسة", "شخصية", "مكعبات", "ليجو", "دبدوب", "حيوان",
            "موسيقى", "سيارة", "شاحنة", "قطار", "كرة", "نشاط", "مركز", "جيم", "سجادة لعب",
            "مشاية", "هزاز", "مرجيحة", "نطاطة", "خشخشة", "عضاضة", "ألعاب استحمام", "ماء",
            "رمل", "خارجي", "ركوب", "دراجة", "سكوتر", "خوذة", "بطارية", "ريموت",
        ],
        weak_keywords: &["fun", "play", "learn", "educational"],
        negative: &[],
        weight: 10,
    },
    BuiltinRule {
        id: "clothing",
        keywords: &[
            "clothing", "clothes", "wear", "apparel", "outfit", "set", "suit", "dress",
            "skirt", "shirt", "t-shirt", "top", "blouse", "pants", "trousers", "jeans",
            "leggings", "shorts", "jacket", "coat", "vest", "sweater", "cardigan", "hoodie",
            "jumper", "sweatshirt", "onesie", "romper", "bodysuit", "jumpsuit", "pajama",
            "sleepwear", "robe", "gown", "nightgown", "underwear", "briefs", "panties",
            "boxers", "socks", "tights", "shoes", "boots", "booties", "sandals", "slippers",
            "sneakers", "trainers", "hat", "cap", "beanie", "gloves", "mittens", "scarf",
            "swimwear", "swimsuit", "bikini", "trunks", "costume", "uniform", "ملابس", "لبس",
            "زي", "طقم", "بدلة", "فستان", "تنورة", "جيب", "قميص", "تيشرت", "بلوزة", "بنطلون",
            "جينز", "ليقنز", "شورت", "جاكيت", "معطف", "بالطو", "فيست", "بلوفر", "سويت شيرت",
            "هودي", "سالوبيت", "بربتوز", "بيجامة", "ملابس نوم", "روب", "ملابس داخلية", "كلسون",
            "بوكسر", "شراب", "جوارب", "كولون", "حذاء", "جزمة", "صندل", "شبشب", "كوتشي", "قبعة",
            "طاقية", "قفاز", "جوانتي", "كوفية", "مايوه", "ملابس سباحة", "تنكري", "يونيفورم",
        ],
        weak_keywords: &[],
        negative: &["doll", "toy"],
        weight: 10,
    },
    BuiltinRule {
        id: "maternity",
        keywords: &[
            "maternity", "pregnancy", "pregnant", "nursing", "breastfeeding", "mom", "mum",
            "mother", "postpartum", "hospital bag", "belly", "support", "belt", "band",
            "pillow", "bra", "underwear", "shapewear", "dress", "tops", "pants", "jeans",
            "leggings", "cream", "oil", "lotion", "stretch mark", "nipple", "care", "pad",
            "shield", "supplement", "vitamin", "tea", "أمام", "أمومة", "حمل", "حامل", "رضاعة",
            "طبيعية", "أم", "ماما", "نفاس", "شنطة الولادة", "بطن", "دعم", "حزام", "مشد",
            "وسادة", "مخدة", "حمالة صدر", "توب", "بنطلون", "جينز", "ليقنز", "كريم", "زيت",
            "لوشن", "علامات تمدد", "تشققات", "حلمة", "عناية", "قطن", "مكمل", "فيتامين", "شاي",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 10,
    },
    BuiltinRule {
        id: "nursery",
        keywords: &[
            "nursery", "room", "furniture", "decor", "bed", "crib", "cot", "cradle",
            "bassinet", "mattress", "sheet", "bedding", "blanket", "comforter", "quilt",
            "pillow", "bumper", "mobile", "canopy", "net", "curtain", "rug", "carpet", "mat",
            "lamp", "light", "nightlight", "storage", "organizer", "box", "basket", "bin",
            "chest", "wardrobe", "closet", "hanger", "shelf", "table", "chair", "sofa",
            "beanbag", "rocker", "glider", "ottoman", "wallpaper", "sticker", "decal", "غرفة",
            "نوم", "أثاث", "ديكور", "سرير", "مهد", "مرتبة", "ملاءة", "مفرش", "بطانية", "لحاف",
            "وسادة", "مخدة", "ناموسية", "ستارة", "سجادة", "مصباح", "إضاءة", "وناسة", "تخزين",
            "منظم", "صندوق", "سلة", "دولاب", "خزانة", "شماعة", "رف", "طاولة", "كرسي", "كنبة",
            "بين باج", "هزاز", "ورق حائط", "ملصق",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 8,
    },
    BuiltinRule {
        id: "bathing",
        keywords: &[
            "bath", "bathing", "tub", "stand", "seat", "support", "mat", "non-slip",
            "thermometer", "rinser", "jug", "cup", "toy", "storage", "organizer", "towel",
            "hooded", "washcloth", "sponge", "mitt", "robe", "gown", "shampoo", "wash", "soap",
            "bubble", "oil", "lotion", "cream", "powder", "cologne", "perfume", "brush",
            "comb", "manicure", "clippers", "scissors", "aspirator", "استحمام", "حمام", "حوض",
            "بانيو", "مسند", "كرسي", "سجادة", "مانع انزلاق", "ميزان حرارة", "كوب", "لعبة",
            "تخزين", "منظم", "منشفة", "بشكير", "برنس", "ليفة", "إسفنجة", "روب", "شامبو",
            "غسول", "صابون", "رغوة", "زيت", "لوشن", "كريم", "بودرة", "كولونيا", "عطر", "فرشاة",
            "مشط", "مقص", "أظافر", "شفاط",
        ],
        weak_keywords: &[],
        negative: &[],
        weight: 9,
    },
];

/// Static definition of a builtin rule
#[derive(Debug, Clone)]
pub struct BuiltinRule {
    /// Category id (unique)
    pub id: &'static str,
    /// Primary keywords, matched against every channel
    pub keywords: &'static [&'static str],
    /// Low-value keywords, matched against the description only
    pub weak_keywords: &'static [&'static str],
    /// Penalty keywords, matched against the name only
    pub negative: &'static [&'static str],
    /// Score multiplier
    pub weight: u32,
}

/// Runtime category rule
///
/// Built from a [`BuiltinRule`] or a rules file entry. Keywords are
/// lower-cased and de-duplicated on construction, so scoring can compare
/// them directly against case-folded channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub weak_keywords: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    DEFAULT_RULE_WEIGHT
}

impl CategoryRule {
    /// Build a validated rule.
    pub fn new<K, W, N>(
        id: impl Into<String>,
        keywords: K,
        weak_keywords: W,
        negative: N,
        weight: u32,
    ) -> Result<Self>
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let rule = Self {
            id: id.into(),
            keywords: fold_keywords(keywords),
            weak_keywords: fold_keywords(weak_keywords),
            negative: fold_keywords(negative),
            weight,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Re-apply case folding and de-duplication, then validate.
    ///
    /// Used for rules that arrive through deserialization.
    pub fn normalized(self) -> Result<Self> {
        Self::new(
            self.id,
            self.keywords,
            self.weak_keywords,
            self.negative,
            self.weight,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ShelfsortError::EmptyRuleId);
        }
        if self.id == UNCATEGORIZED {
            return Err(ShelfsortError::ReservedRuleId {
                id: self.id.clone(),
            });
        }
        if self.keywords.is_empty() {
            return Err(ShelfsortError::EmptyKeywords {
                id: self.id.clone(),
            });
        }
        // An empty needle is a substring of everything.
        let has_blank = self
            .keywords
            .iter()
            .chain(&self.weak_keywords)
            .chain(&self.negative)
            .any(|k| k.trim().is_empty());
        if has_blank {
            return Err(ShelfsortError::BlankKeyword {
                id: self.id.clone(),
            });
        }
        if self.weight == 0 {
            return Err(ShelfsortError::InvalidWeight {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

impl From<&BuiltinRule> for CategoryRule {
    fn from(builtin: &BuiltinRule) -> Self {
        Self {
            id: builtin.id.to_string(),
            keywords: fold_keywords(builtin.keywords),
            weak_keywords: fold_keywords(builtin.weak_keywords),
            negative: fold_keywords(builtin.negative),
            weight: builtin.weight,
        }
    }
}

/// Lower-case every keyword and drop repeats, keeping first occurrence.
fn fold_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut folded: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.as_ref().to_lowercase();
        if !folded.contains(&keyword) {
            folded.push(keyword);
        }
    }
    folded
}
