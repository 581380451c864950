//! Static reference lookups used by the prescription composer:
//! specialization-keyed diagnosis / test suggestions and the two fixed
//! inventory lists (injections, surgical).

use std::collections::HashMap;

use crate::models::{InventoryCategory, InventoryItem};

/// Suggestions attached to one specialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub diagnoses: Vec<String>,
    pub tests: Vec<String>,
}

/// Specialization (trimmed, lowercased) to suggestions. Unknown keys
/// resolve to an empty set.
#[derive(Debug, Clone, Default)]
pub struct SpecializationCatalog {
    entries: HashMap<String, Suggestions>,
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

type SpecialtyRow = (&'static [&'static str], &'static [&'static str], &'static [&'static str]);

/// (names, diagnoses, tests)
const SPECIALTIES: &[SpecialtyRow] = &[
    (
        &["general medicine", "general physician", "general practice"],
        &[
            "Viral fever",
            "Upper respiratory tract infection",
            "Acute gastroenteritis",
            "Type 2 diabetes mellitus",
            "Essential hypertension",
            "Typhoid fever",
        ],
        &["Complete blood count", "Blood sugar (fasting)", "Urine routine", "Widal test", "Lipid profile"],
    ),
    (
        &["cardiology", "cardiologist"],
        &[
            "Essential hypertension",
            "Coronary artery disease",
            "Stable angina",
            "Congestive heart failure",
            "Atrial fibrillation",
        ],
        &["ECG", "2D Echo", "Lipid profile", "Troponin I", "Treadmill test"],
    ),
    (
        &["orthopedics", "orthopaedics", "orthopedic"],
        &[
            "Osteoarthritis knee",
            "Lumbar spondylosis",
            "Cervical spondylosis",
            "Ankle sprain",
            "Fracture",
        ],
        &["X-ray", "Serum vitamin D", "Serum calcium", "MRI", "Uric acid"],
    ),
    (
        &["pediatrics", "paediatrics", "pediatrician"],
        &["Acute otitis media", "Bronchiolitis", "Viral fever", "Acute diarrhea", "Tonsillitis"],
        &["Complete blood count", "Stool routine", "Chest X-ray", "CRP"],
    ),
    (
        &["dermatology", "dermatologist"],
        &["Acne vulgaris", "Tinea corporis", "Atopic dermatitis", "Psoriasis", "Urticaria"],
        &["KOH mount", "Skin biopsy", "Serum IgE", "Thyroid profile"],
    ),
    (
        &["ent", "otorhinolaryngology"],
        &["Acute sinusitis", "Chronic tonsillitis", "Allergic rhinitis", "Otitis externa"],
        &["Audiometry", "X-ray PNS", "Nasal endoscopy"],
    ),
    (
        &["gynecology", "gynaecology", "obstetrics and gynecology"],
        &["Polycystic ovary syndrome", "Urinary tract infection", "Dysmenorrhea", "Anemia in pregnancy"],
        &["Ultrasound pelvis", "Hemoglobin", "Urine culture", "Thyroid profile", "Beta hCG"],
    ),
    (
        &["neurology", "neurologist"],
        &["Migraine", "Tension-type headache", "Epilepsy", "Peripheral neuropathy", "Vertigo"],
        &["MRI brain", "EEG", "Nerve conduction study", "Vitamin B12"],
    ),
    (
        &["pulmonology", "chest medicine"],
        &["Bronchial asthma", "COPD", "Community-acquired pneumonia", "Pulmonary tuberculosis"],
        &["Chest X-ray", "Spirometry", "Sputum AFB", "HRCT chest"],
    ),
    (
        &["gastroenterology"],
        &["GERD", "Acid peptic disease", "Irritable bowel syndrome", "Fatty liver"],
        &["Liver function test", "Ultrasound abdomen", "Upper GI endoscopy", "H. pylori test"],
    ),
];

impl SpecializationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table of common outpatient specializations.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (names, diagnoses, tests) in SPECIALTIES {
            for name in names.iter() {
                catalog.insert(name, diagnoses, tests);
            }
        }
        catalog
    }

    pub fn insert(&mut self, specialization: &str, diagnoses: &[&str], tests: &[&str]) {
        let key = normalize(specialization);
        if key.is_empty() {
            return;
        }
        self.entries.insert(
            key,
            Suggestions {
                diagnoses: diagnoses.iter().map(|s| s.to_string()).collect(),
                tests: tests.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    pub fn lookup(&self, specialization: &str) -> Option<&Suggestions> {
        self.entries.get(&normalize(specialization))
    }

    pub fn diagnoses_for(&self, specialization: &str) -> &[String] {
        self.lookup(specialization)
            .map(|s| s.diagnoses.as_slice())
            .unwrap_or_default()
    }

    pub fn tests_for(&self, specialization: &str) -> &[String] {
        self.lookup(specialization)
            .map(|s| s.tests.as_slice())
            .unwrap_or_default()
    }

    /// Diagnoses for the specialization containing `query`, ignoring case.
    pub fn matching_diagnoses(&self, specialization: &str, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.diagnoses_for(specialization)
            .iter()
            .filter(|d| query.is_empty() || d.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }
}

/// The fixed injections / surgical reference lists.
#[derive(Debug, Clone)]
pub struct InventoryCatalog {
    injections: Vec<InventoryItem>,
    surgical: Vec<InventoryItem>,
}

/// (name, code, dosage, usage)
const INJECTIONS: &[(&str, &str, &str, &str)] = &[
    ("Ceftriaxone", "INJ-001", "1 g", "IV / IM, bacterial infections"),
    ("Diclofenac Sodium", "INJ-002", "75 mg/3 ml", "IM, pain and inflammation"),
    ("Ondansetron", "INJ-003", "4 mg/2 ml", "IV / IM, nausea and vomiting"),
    ("Pantoprazole", "INJ-004", "40 mg", "IV, acid suppression"),
    ("Dexamethasone", "INJ-005", "4 mg/ml", "IV / IM, inflammation and allergy"),
    ("Tetanus Toxoid", "INJ-006", "0.5 ml", "IM, tetanus prophylaxis"),
    ("Vitamin B12 (Methylcobalamin)", "INJ-007", "1500 mcg", "IM, B12 deficiency"),
    ("Insulin Regular", "INJ-008", "40 IU/ml", "SC, blood sugar control"),
];

const SURGICAL: &[(&str, &str, &str, &str)] = &[
    ("Sterile Gauze Swab", "SUR-001", "10 x 10 cm", "Wound cleaning and dressing"),
    ("Crepe Bandage", "SUR-002", "10 cm", "Compression and support"),
    ("Disposable Syringe", "SUR-003", "5 ml", "Injection administration"),
    ("IV Cannula", "SUR-004", "20 G", "Intravenous access"),
    ("Surgical Gloves", "SUR-005", "Size 7", "Sterile procedures"),
    ("Absorbable Suture", "SUR-006", "3-0", "Wound closure"),
    ("Micropore Tape", "SUR-007", "1 inch", "Securing dressings"),
    ("Urine Catheter (Foley)", "SUR-008", "16 Fr", "Urinary drainage"),
];

fn items_from(rows: &[(&str, &str, &str, &str)], category: InventoryCategory) -> Vec<InventoryItem> {
    rows.iter()
        .map(|(name, code, dosage, usage)| InventoryItem {
            name: name.to_string(),
            code: code.to_string(),
            dosage: dosage.to_string(),
            usage: usage.to_string(),
            category,
        })
        .collect()
}

impl Default for InventoryCatalog {
    fn default() -> Self {
        Self {
            injections: items_from(INJECTIONS, InventoryCategory::Injections),
            surgical: items_from(SURGICAL, InventoryCategory::Surgical),
        }
    }
}

impl InventoryCatalog {
    pub fn items(&self, category: InventoryCategory) -> &[InventoryItem] {
        match category {
            InventoryCategory::Injections => &self.injections,
            InventoryCategory::Surgical => &self.surgical,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &InventoryItem> {
        self.injections.iter().chain(self.surgical.iter())
    }

    /// Case-insensitive substring match on name or code. Blank query
    /// returns nothing.
    pub fn search(&self, query: &str) -> Vec<&InventoryItem> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.all()
            .filter(|item| {
                item.name.to_lowercase().contains(&query) || item.code.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn find_by_code(&self, code: &str) -> Option<&InventoryItem> {
        self.all().find(|item| item.code.eq_ignore_ascii_case(code.trim()))
    }
}
