use std::fmt;

#[derive(Debug, Clone)]
pub struct Hex(String);

impl Hex {
    pub fn encode(data: &[u8]) -> Self {
        Hex(hex::encode(data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
