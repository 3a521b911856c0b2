pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an intelligent E-Learning & Education Assistant. You help students and learners with:
- Explaining complex concepts in simple terms
- Study materials, course content, and exam preparation
- Problem-solving and step-by-step guidance
- Research assistance and academic resources
- Learning strategies and study techniques

Provide accurate, educational, and encouraging responses. Use examples and analogies to make concepts clear. Adapt your explanations based on the learner's level.";

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;
pub const MAX_RETRIEVED_DOCS: usize = 4;
pub const MAX_SEARCH_RESULTS: usize = 5;
pub const CONCISE_MAX_TOKENS: u32 = 150;
pub const DETAILED_MAX_TOKENS: u32 = 1000;
pub const MAX_FILE_SIZE_MB: u64 = 10;
pub const MAX_IMAGE_SIZE_MB: u64 = 10;
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

pub const SUPPORTED_FILE_TYPES: [&str; 4] = ["pdf", "txt", "docx", "md"];
pub const SUPPORTED_IMAGE_TYPES: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
