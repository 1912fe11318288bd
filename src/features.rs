//! Patient form inputs and their encoding into the model's feature vector.
//!
//! The column order and the integer codes below are the ones the shipped model was
//! trained against. Thalassemia is coded from 1 while every other categorical field is
//! coded from 0; the model depends on that, so it stays.

use std::ops::RangeInclusive;

use clap::ValueEnum;
use thiserror::Error;

pub const FEATURE_COUNT: usize = 13;

/// Column names of the heart dataset, in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

pub type FeatureVector = [f64; FEATURE_COUNT];

pub const AGE_RANGE: RangeInclusive<u8> = 20..=100;
pub const RESTING_BP_RANGE: RangeInclusive<u16> = 90..=200;
pub const CHOLESTEROL_RANGE: RangeInclusive<u16> = 100..=400;
pub const MAX_HEART_RATE_RANGE: RangeInclusive<u16> = 60..=220;
pub const OLDPEAK_RANGE: RangeInclusive<f64> = 0.0..=6.0;
pub const OLDPEAK_STEP: f64 = 0.1;
pub const VESSELS_RANGE: RangeInclusive<u8> = 0..=3;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("oldpeak must be a multiple of 0.1, got {0}")]
    OffStep(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    pub fn code(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Answer to the yes/no questions of the form (fasting blood sugar, exercise angina).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

impl YesNo {
    pub const ALL: [Self; 2] = [Self::No, Self::Yes];

    pub fn code(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum ChestPain {
    #[default]
    TypicalAngina,
    AtypicalAngina,
    NonAnginalPain,
    Asymptomatic,
}

impl ChestPain {
    pub const ALL: [Self; 4] = [
        Self::TypicalAngina,
        Self::AtypicalAngina,
        Self::NonAnginalPain,
        Self::Asymptomatic,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::TypicalAngina => 0,
            Self::AtypicalAngina => 1,
            Self::NonAnginalPain => 2,
            Self::Asymptomatic => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TypicalAngina => "Typical Angina",
            Self::AtypicalAngina => "Atypical Angina",
            Self::NonAnginalPain => "Non-anginal Pain",
            Self::Asymptomatic => "Asymptomatic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum RestingEcg {
    #[default]
    Normal,
    StTWaveAbnormality,
    LeftVentricularHypertrophy,
}

impl RestingEcg {
    pub const ALL: [Self; 3] = [
        Self::Normal,
        Self::StTWaveAbnormality,
        Self::LeftVentricularHypertrophy,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::StTWaveAbnormality => 1,
            Self::LeftVentricularHypertrophy => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::StTWaveAbnormality => "ST-T Wave Abnormality",
            Self::LeftVentricularHypertrophy => "Left Ventricular Hypertrophy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum StSlope {
    #[default]
    Upsloping,
    Flat,
    Downsloping,
}

impl StSlope {
    pub const ALL: [Self; 3] = [Self::Upsloping, Self::Flat, Self::Downsloping];

    pub fn code(self) -> u8 {
        match self {
            Self::Upsloping => 0,
            Self::Flat => 1,
            Self::Downsloping => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Upsloping => "Upsloping",
            Self::Flat => "Flat",
            Self::Downsloping => "Downsloping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Thalassemia {
    #[default]
    Normal,
    FixedDefect,
    ReversibleDefect,
}

impl Thalassemia {
    pub const ALL: [Self; 3] = [Self::Normal, Self::FixedDefect, Self::ReversibleDefect];

    /// 1-based, unlike the other categorical codes.
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::FixedDefect => 2,
            Self::ReversibleDefect => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FixedDefect => "Fixed Defect",
            Self::ReversibleDefect => "Reversible Defect",
        }
    }
}

/// Everything the form collects for one assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientInput {
    pub age: u8,
    pub sex: Sex,
    pub chest_pain: ChestPain,
    pub resting_bp: u16,
    pub cholesterol: u16,
    pub fasting_blood_sugar: YesNo,
    pub resting_ecg: RestingEcg,
    pub max_heart_rate: u16,
    pub exercise_angina: YesNo,
    pub oldpeak: f64,
    pub slope: StSlope,
    pub vessels: u8,
    pub thalassemia: Thalassemia,
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            age: 45,
            sex: Sex::default(),
            chest_pain: ChestPain::default(),
            resting_bp: 120,
            cholesterol: 200,
            fasting_blood_sugar: YesNo::default(),
            resting_ecg: RestingEcg::default(),
            max_heart_rate: 150,
            exercise_angina: YesNo::default(),
            oldpeak: 1.0,
            slope: StSlope::default(),
            vessels: 0,
            thalassemia: Thalassemia::default(),
        }
    }
}

fn check_range<T>(
    field: &'static str,
    range: &RangeInclusive<T>,
    value: T,
) -> Result<(), InputError>
where
    T: PartialOrd + Copy + Into<f64>,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(InputError::OutOfRange {
            field,
            min: (*range.start()).into(),
            max: (*range.end()).into(),
            value: value.into(),
        })
    }
}

impl PatientInput {
    /// Checks the numeric fields against the domains the form's sliders allow.
    pub fn validate(&self) -> Result<(), InputError> {
        check_range("age", &AGE_RANGE, self.age)?;
        check_range("resting_bp", &RESTING_BP_RANGE, self.resting_bp)?;
        check_range("cholesterol", &CHOLESTEROL_RANGE, self.cholesterol)?;
        check_range("max_heart_rate", &MAX_HEART_RATE_RANGE, self.max_heart_rate)?;
        check_range("oldpeak", &OLDPEAK_RANGE, self.oldpeak)?;
        check_range("vessels", &VESSELS_RANGE, self.vessels)?;

        let steps = self.oldpeak / OLDPEAK_STEP;
        if (steps - steps.round()).abs() > 1e-6 {
            return Err(InputError::OffStep(self.oldpeak));
        }

        Ok(())
    }

    /// The categorical choices as the form shows them, keyed by column name.
    pub fn selections(&self) -> [(&'static str, &'static str); 7] {
        [
            ("sex", self.sex.label()),
            ("cp", self.chest_pain.label()),
            ("fbs", self.fasting_blood_sugar.label()),
            ("restecg", self.resting_ecg.label()),
            ("exang", self.exercise_angina.label()),
            ("slope", self.slope.label()),
            ("thal", self.thalassemia.label()),
        ]
    }

    pub fn encode(&self) -> FeatureVector {
        [
            f64::from(self.age),
            f64::from(self.sex.code()),
            f64::from(self.chest_pain.code()),
            f64::from(self.resting_bp),
            f64::from(self.cholesterol),
            f64::from(self.fasting_blood_sugar.code()),
            f64::from(self.resting_ecg.code()),
            f64::from(self.max_heart_rate),
            f64::from(self.exercise_angina.code()),
            self.oldpeak,
            f64::from(self.slope.code()),
            f64::from(self.vessels),
            f64::from(self.thalassemia.code()),
        ]
    }
}
