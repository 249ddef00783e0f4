//! Supported snippet languages and their canned samples.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RunnerError;

const JAVASCRIPT_SAMPLE: &str = r#"// Reverse an array
const arr = [1, 2, 3, 4, 5];
const reversed = arr.reverse();
console.log(reversed);

// Calculate factorial
function factorial(n) {
  if (n <= 1) return 1;
  return n * factorial(n - 1);
}
console.log('Factorial of 5:', factorial(5));"#;

const PYTHON_SAMPLE: &str = r#"# Calculate sum of numbers
numbers = [1, 2, 3, 4, 5]
total = sum(numbers)
print(f"Sum: {total}")

# Simple function
def greet(name):
    return f"Hello, {name}!"

print(greet("World"))"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Evaluated synchronously in the embedded engine.
    #[default]
    JavaScript,
    /// Evaluated in the lazily started managed interpreter.
    Python,
}

impl Language {
    /// Identifier used on language tabs and in config files.
    pub fn id(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
        }
    }

    pub fn sample(self) -> &'static str {
        match self {
            Language::JavaScript => JAVASCRIPT_SAMPLE,
            Language::Python => PYTHON_SAMPLE,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "python" | "py" | "python3" => Ok(Language::Python),
            other => Err(RunnerError::ConfigError(format!(
                "Unsupported language: {}",
                other
            ))),
        }
    }
}
