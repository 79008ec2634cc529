use std::{fmt, ops::Deref, str::FromStr};

use crate::error::Error;

/// An intcode program: the ordered words that make up a VM's initial memory.
///
/// ```
/// use intcode_vm::core::program::Program;
///
/// let program: Program = "1,9,10,3,2,3,11,0,99,30,40,50\n".parse().expect("invalid program");
/// assert_eq!(program.len(), 12);
/// assert_eq!(program[0], 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Program {
    words: Vec<i64>,
}

impl Program {
    /// Creates a program from its words.
    pub fn new(words: Vec<i64>) -> Self {
        Self { words }
    }

    /// Parses a single line of comma-separated signed decimal integers.
    pub fn parse(source: &str) -> Result<Self, Error> {
        source
            .trim()
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token
                    .parse::<i64>()
                    .map_err(|_| Error::MalformedProgram { index, token: token.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// The words of the program.
    pub fn words(&self) -> &[i64] {
        &self.words
    }

    /// Consumes the program, returning its words.
    pub fn into_words(self) -> Vec<i64> {
        self.words
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Deref for Program {
    type Target = [i64];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

impl From<Vec<i64>> for Program {
    fn from(words: Vec<i64>) -> Self {
        Self::new(words)
    }
}

impl From<&[i64]> for Program {
    fn from(words: &[i64]) -> Self {
        Self::new(words.to_vec())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{word}")?;
        }
        Ok(())
    }
}
