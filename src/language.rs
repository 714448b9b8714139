use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// Languages offered by the test's code editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Python,
    Java,
    Cpp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Starter code placed in the editor when the language is selected.
    pub fn starter_template(&self) -> &'static str {
        match self {
            Language::Javascript => {
                "function sumEvenNumbers(arr) {\n    // Write your solution here\n    \n}"
            }
            Language::Python => "def sum_even_numbers(arr):\n    # Write your solution here\n    pass",
            Language::Java => "public class Solution {\n    public static int sumEvenNumbers(int[] arr) {\n        // Write your solution here\n        return 0;\n    }\n}",
            Language::Cpp => "#include <vector>\nusing namespace std;\n\nint sumEvenNumbers(vector<int>& arr) {\n    // Write your solution here\n    return 0;\n}",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::Javascript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(anyhow!("unsupported editor language '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn parses_aliases_and_rejects_unknown() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn every_template_mentions_the_exercise() {
        for language in [Language::Javascript, Language::Python, Language::Java, Language::Cpp] {
            let template = language.starter_template().to_lowercase().replace('_', "");
            assert!(template.contains("sumevennumbers"), "{language}");
        }
    }
}
