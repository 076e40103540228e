use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed per-criterion maximum. Rubric scores are 0..=4 across both
/// evaluation kinds.
pub const MAX_CRITERION_SCORE: u8 = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grades: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Curriculum pacing marker on a general-evaluation criterion. Wire values
/// are the Arabic strings the host application stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProgressStatus {
    #[serde(rename = "متقدم")]
    Ahead,
    #[serde(rename = "مطابق")]
    OnTrack,
    #[serde(rename = "متأخر")]
    Behind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub label: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lesson_title: Option<String>,
}

impl Criterion {
    pub fn new(id: &str, label: &str) -> Self {
        Criterion {
            id: id.to_string(),
            label: label.to_string(),
            score: 0,
            progress: None,
            last_lesson_title: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CriterionGroup {
    pub id: String,
    pub title: String,
    pub criteria: Vec<Criterion>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionSubType {
    Brief,
    Extended,
    SubjectSpecific,
}

impl SessionSubType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionSubType::Brief => "brief",
            SessionSubType::Extended => "extended",
            SessionSubType::SubjectSpecific => "subject_specific",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Semester {
    #[serde(rename = "الأول")]
    First,
    #[serde(rename = "الثاني")]
    Second,
}

impl Semester {
    pub fn as_str(self) -> &'static str {
        match self {
            Semester::First => "الأول",
            Semester::Second => "الثاني",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VisitType {
    #[serde(rename = "استطلاعية")]
    Exploratory,
    #[serde(rename = "تقييمية 1")]
    Evaluative1,
    #[serde(rename = "تقييمية 2")]
    Evaluative2,
    #[serde(rename = "فنية إشرافية")]
    Supervisory,
    #[serde(rename = "تطويرية")]
    Developmental,
    #[serde(rename = "تبادلية")]
    Exchange,
    #[serde(rename = "تشخيصية")]
    Diagnostic,
    #[serde(rename = "علاجية")]
    Remedial,
}

impl VisitType {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitType::Exploratory => "استطلاعية",
            VisitType::Evaluative1 => "تقييمية 1",
            VisitType::Evaluative2 => "تقييمية 2",
            VisitType::Supervisory => "فنية إشرافية",
            VisitType::Developmental => "تطويرية",
            VisitType::Exchange => "تبادلية",
            VisitType::Diagnostic => "تشخيصية",
            VisitType::Remedial => "علاجية",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClassNumber {
    #[serde(rename = "الأول")]
    First,
    #[serde(rename = "الثاني")]
    Second,
    #[serde(rename = "الثالث")]
    Third,
    #[serde(rename = "الرابع")]
    Fourth,
    #[serde(rename = "الخامس")]
    Fifth,
    #[serde(rename = "السادس")]
    Sixth,
    #[serde(rename = "السابع")]
    Seventh,
    #[serde(rename = "الثامن")]
    Eighth,
    #[serde(rename = "التاسع")]
    Ninth,
    #[serde(rename = "العاشر")]
    Tenth,
    #[serde(rename = "الحادي عشر")]
    Eleventh,
    #[serde(rename = "الثاني عشر")]
    Twelfth,
}

impl ClassNumber {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassNumber::First => "الأول",
            ClassNumber::Second => "الثاني",
            ClassNumber::Third => "الثالث",
            ClassNumber::Fourth => "الرابع",
            ClassNumber::Fifth => "الخامس",
            ClassNumber::Sixth => "السادس",
            ClassNumber::Seventh => "السابع",
            ClassNumber::Eighth => "الثامن",
            ClassNumber::Ninth => "التاسع",
            ClassNumber::Tenth => "العاشر",
            ClassNumber::Eleventh => "الحادي عشر",
            ClassNumber::Twelfth => "الثاني عشر",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Section {
    #[serde(rename = "أ")]
    A,
    #[serde(rename = "ب")]
    B,
    #[serde(rename = "ج")]
    C,
    #[serde(rename = "د")]
    D,
    #[serde(rename = "هـ")]
    E,
    #[serde(rename = "و")]
    F,
    #[serde(rename = "ز")]
    G,
    #[serde(rename = "ح")]
    H,
    #[serde(rename = "ط")]
    I,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::A => "أ",
            Section::B => "ب",
            Section::C => "ج",
            Section::D => "د",
            Section::E => "هـ",
            Section::F => "و",
            Section::G => "ز",
            Section::H => "ح",
            Section::I => "ط",
        }
    }
}

/// Fields shared by both report variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportBase {
    pub id: String,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub school: String,
    pub subject: String,
    pub grades: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralReport {
    #[serde(flatten)]
    pub base: ReportBase,
    pub criteria: Vec<Criterion>,
    pub strategies: String,
    pub tools: String,
    pub programs: String,
    pub sources: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassSessionReport {
    #[serde(flatten)]
    pub base: ReportBase,
    pub sub_type: SessionSubType,
    pub supervisor_name: String,
    pub semester: Semester,
    pub visit_type: VisitType,
    pub class: ClassNumber,
    pub section: Section,
    pub lesson_number: String,
    pub lesson_name: String,
    pub criterion_groups: Vec<CriterionGroup>,
    pub positives: String,
    pub notes_for_improvement: String,
    pub recommendations: String,
    pub employee_comment: String,
}

/// One evaluation. The discriminant is carried on the wire as
/// `evaluationType`; every consumer branches exhaustively on it so a new
/// kind is a compile-time exercise, not a runtime surprise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "evaluationType")]
pub enum Report {
    #[serde(rename = "general")]
    General(GeneralReport),
    #[serde(rename = "class_session")]
    ClassSession(ClassSessionReport),
}

impl Report {
    pub fn base(&self) -> &ReportBase {
        match self {
            Report::General(r) => &r.base,
            Report::ClassSession(r) => &r.base,
        }
    }

    pub fn kind(&self) -> EvaluationKind {
        match self {
            Report::General(_) => EvaluationKind::General,
            Report::ClassSession(_) => EvaluationKind::ClassSession,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    General,
    ClassSession,
}

impl EvaluationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationKind::General => "general",
            EvaluationKind::ClassSession => "class_session",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(EvaluationKind::General),
            "class_session" => Some(EvaluationKind::ClassSession),
            _ => None,
        }
    }
}

/// Unscored seed for a criterion; the score is instantiated at 0 when a new
/// report is drafted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CriterionSeed {
    pub id: String,
    pub label: String,
}

/// School-scoped extra criterion definition, created from a report form and
/// consumed by the pre-fill resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomCriterion {
    pub id: String,
    pub school: String,
    pub evaluation_type: EvaluationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<SessionSubType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    pub criterion: CriterionSeed,
}
