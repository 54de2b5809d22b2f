use rand::Rng;

/// Trait for generating phone verification codes
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Six random digits
pub struct RandomCodeGenerator;

impl RandomCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let code: u32 = rand::rng().random_range(0..1_000_000);
        format!("{:06}", code)
    }
}

/// Always hands out the same code. Useful for tests and local demos.
pub struct FixedCodeGenerator {
    code: String,
}

impl FixedCodeGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> String {
        self.code.clone()
    }
}
