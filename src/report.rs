//! Text rendering of an interaction: result block, recommendations and the static page
//! sections around them.

use std::fmt::{self, Write};

use thiserror::Error;

use crate::pipeline::{Interaction, Notice, Outcome};

pub const TITLE: &str = "Heart Attack Risk Prediction";

pub const INTRO: &str = "This app predicts the risk of heart attack based on various health \
parameters. Please fill in the details below to get your prediction and personalized \
recommendations.";

pub const ABOUT_HEADING: &str = "About Heart Health";

pub const ABOUT_INTRO: &str =
    "Heart disease is the leading cause of death worldwide. Key risk factors include:";

pub const RISK_FACTORS: [&str; 9] = [
    "High blood pressure",
    "High cholesterol",
    "Smoking",
    "Diabetes",
    "Obesity",
    "Physical inactivity",
    "Family history of heart disease",
    "Age (risk increases with age)",
    "Stress",
];

pub const ABOUT_OUTRO: &str =
    "Regular check-ups and maintaining a healthy lifestyle can significantly reduce your risk.";

pub const DISCLAIMER: &str = "Disclaimer: This tool is for informational purposes only and is \
not a substitute for professional medical advice, diagnosis, or treatment. Always seek the \
advice of your physician or other qualified health provider with any questions you may have \
regarding a medical condition.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("classifier returned label {0}, expected 0 or 1")]
pub struct UnexpectedLabel(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Low,
}

pub struct Recommendations {
    pub intro: &'static str,
    pub items: &'static [&'static str],
    pub outro: &'static str,
}

pub const HIGH_RISK_RECOMMENDATIONS: Recommendations = Recommendations {
    intro: "Based on your assessment, you appear to be at higher risk for heart disease. \
We strongly recommend:",
    items: &[
        "Consult a cardiologist for a comprehensive evaluation",
        "Adopt a heart-healthy diet low in saturated fats and sodium",
        "Engage in regular physical activity as recommended by your doctor",
        "Monitor your blood pressure and cholesterol regularly",
        "Quit smoking if you currently smoke",
        "Limit alcohol consumption",
        "Manage stress through meditation, yoga, or other relaxation techniques",
        "Maintain a healthy weight",
    ],
    outro: "Please remember that this is a screening tool, not a medical diagnosis. \
Always consult with healthcare professionals for personalized advice.",
};

pub const LOW_RISK_RECOMMENDATIONS: Recommendations = Recommendations {
    intro: "Your assessment suggests a lower risk for heart disease. To maintain heart health:",
    items: &[
        "Continue with regular physical activity (at least 150 minutes per week)",
        "Eat a balanced diet rich in fruits, vegetables, and whole grains",
        "Maintain a healthy weight",
        "Get regular health check-ups",
        "Avoid smoking and limit alcohol consumption",
        "Manage stress effectively",
    ],
    outro: "Even with a lower risk profile, maintaining heart-healthy habits is important \
for long-term cardiovascular health.",
};

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Low => "Low Risk",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Self::High => "High Risk of Heart Attack",
            Self::Low => "Low Risk of Heart Attack",
        }
    }

    pub fn recommendations(self) -> &'static Recommendations {
        match self {
            Self::High => &HIGH_RISK_RECOMMENDATIONS,
            Self::Low => &LOW_RISK_RECOMMENDATIONS,
        }
    }
}

/// A classified risk together with the probability of that class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub level: RiskLevel,
    pub probability: f64,
}

impl Assessment {
    pub fn from_prediction(label: u8, proba: [f64; 2]) -> Result<Self, UnexpectedLabel> {
        let [negative, positive] = proba;
        match label {
            1 => Ok(Self {
                level: RiskLevel::High,
                probability: positive,
            }),
            0 => Ok(Self {
                level: RiskLevel::Low,
                probability: negative,
            }),
            other => Err(UnexpectedLabel(other)),
        }
    }

    /// The class label this assessment was built from.
    pub fn class(&self) -> u8 {
        match self.level {
            RiskLevel::High => 1,
            RiskLevel::Low => 0,
        }
    }

    pub fn probability_line(&self) -> String {
        format!("Probability: {:.2}%", self.probability * 100.0)
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recommendations = self.level.recommendations();

        writeln!(f, "Prediction Result")?;
        writeln!(f, "{}", self.level.headline())?;
        writeln!(f, "{}", self.probability_line())?;
        writeln!(f)?;
        writeln!(f, "Recommendations")?;
        writeln!(f, "{}", recommendations.intro)?;
        writeln!(f)?;
        for item in recommendations.items {
            writeln!(f, "- {item}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", recommendations.outro)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(msg) => write!(f, "error: {msg}"),
            Self::Info(msg) => write!(f, "info: {msg}"),
        }
    }
}

fn write_rule(out: &mut String) -> fmt::Result {
    writeln!(out, "{}", "-".repeat(72))
}

/// Renders the whole page for one interaction.
///
/// A halted interaction stops right after its notices, like the form page does when the
/// features cannot be transformed.
pub fn render(interaction: &Interaction) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "{TITLE}")?;
    writeln!(out, "{}", "=".repeat(TITLE.len()))?;
    writeln!(out, "{INTRO}")?;
    writeln!(out)?;

    for notice in &interaction.notices {
        writeln!(out, "{notice}")?;
    }

    match &interaction.outcome {
        Outcome::Halted => return Ok(out),
        Outcome::Assessed(assessment) => {
            writeln!(out)?;
            write!(out, "{assessment}")?;
        }
        Outcome::Pending | Outcome::PredictionFailed => {}
    }

    writeln!(out)?;
    write_rule(&mut out)?;
    writeln!(out, "{ABOUT_HEADING}")?;
    writeln!(out, "{ABOUT_INTRO}")?;
    for factor in RISK_FACTORS {
        writeln!(out, "- {factor}")?;
    }
    writeln!(out)?;
    writeln!(out, "{ABOUT_OUTRO}")?;
    writeln!(out)?;
    write_rule(&mut out)?;
    writeln!(out, "{DISCLAIMER}")?;

    Ok(out)
}
