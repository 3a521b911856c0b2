use serde::{Deserialize, Serialize};

use crate::core::config::settings::ResponseSettings;

pub const CONCISE_INSTRUCTION: &str =
    "\n\nProvide a brief, concise response (2-3 sentences maximum).";
pub const DETAILED_INSTRUCTION: &str =
    "\n\nProvide a comprehensive, detailed response with explanations, examples, and actionable insights.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Concise,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseModeConfig {
    pub instruction_suffix: &'static str,
    pub max_tokens: u32,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Concise => "concise",
            ResponseMode::Detailed => "detailed",
        }
    }

    pub fn config(&self, ceilings: &ResponseSettings) -> ResponseModeConfig {
        match self {
            ResponseMode::Concise => ResponseModeConfig {
                instruction_suffix: CONCISE_INSTRUCTION,
                max_tokens: ceilings.concise_max_tokens,
            },
            ResponseMode::Detailed => ResponseModeConfig {
                instruction_suffix: DETAILED_INSTRUCTION,
                max_tokens: ceilings.detailed_max_tokens,
            },
        }
    }
}
