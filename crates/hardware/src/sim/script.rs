//! Workload scripts.
//!
//! A workload is a plain-text list of memory instructions for one process, one per line:
//!
//! ```text
//! # size region
//! alloc 300 0
//! # value region offset
//! write 100 0 20
//! # region offset
//! read 0 20
//! # region
//! free 0
//! ```
//!
//! Blank lines and `#` comments are ignored. Numbers accept a `0x` prefix.

use std::fmt;

use thiserror::Error;

/// One memory instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Allocate `size` bytes for `region`.
    Alloc {
        /// Bytes requested.
        size: u32,
        /// Region id.
        region: u32,
    },
    /// Free `region`.
    Free {
        /// Region id.
        region: u32,
    },
    /// Read the byte at `offset` in `region`.
    Read {
        /// Region id.
        region: u32,
        /// Byte offset.
        offset: u32,
    },
    /// Write `value` at `offset` in `region`.
    Write {
        /// Byte to store.
        value: u8,
        /// Region id.
        region: u32,
        /// Byte offset.
        offset: u32,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Alloc { size, region } => write!(f, "alloc {size} {region}"),
            Self::Free { region } => write!(f, "free {region}"),
            Self::Read { region, offset } => write!(f, "read {region} {offset}"),
            Self::Write {
                value,
                region,
                offset,
            } => write!(f, "write {value} {region} {offset}"),
        }
    }
}

/// Malformed script line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The first word is not an instruction name.
    #[error("line {line}: unknown instruction `{op}`")]
    UnknownOp {
        /// 1-based line number.
        line: usize,
        /// Offending word.
        op: String,
    },

    /// Wrong number of operands.
    #[error("line {line}: `{op}` takes {expected} operands, found {found}")]
    Arity {
        /// 1-based line number.
        line: usize,
        /// Instruction name.
        op: &'static str,
        /// Required operand count.
        expected: usize,
        /// Operands present.
        found: usize,
    },

    /// An operand is not a number in range.
    #[error("line {line}: invalid operand `{token}`")]
    BadOperand {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },
}

fn number(line: usize, token: &str) -> Result<u64, ScriptError> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse::<u64>(),
    };
    parsed.map_err(|_| ScriptError::BadOperand {
        line,
        token: token.to_owned(),
    })
}

fn operands<const N: usize>(
    line: usize,
    op: &'static str,
    args: &[&str],
) -> Result<[u64; N], ScriptError> {
    if args.len() != N {
        return Err(ScriptError::Arity {
            line,
            op,
            expected: N,
            found: args.len(),
        });
    }
    let mut out = [0u64; N];
    for (slot, token) in out.iter_mut().zip(args) {
        *slot = number(line, token)?;
    }
    Ok(out)
}

fn narrow<T: TryFrom<u64>>(line: usize, raw: u64) -> Result<T, ScriptError> {
    T::try_from(raw).map_err(|_| ScriptError::BadOperand {
        line,
        token: raw.to_string(),
    })
}

/// Parses one non-empty, comment-free line.
///
/// # Errors
///
/// [`ScriptError`] describing the first problem found.
pub fn parse_line(line: usize, text: &str) -> Result<Instruction, ScriptError> {
    let mut words = text.split_whitespace();
    let op = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match op {
        "alloc" => {
            let [size, region] = operands::<2>(line, "alloc", &args)?;
            Ok(Instruction::Alloc {
                size: narrow(line, size)?,
                region: narrow(line, region)?,
            })
        }
        "free" => {
            let [region] = operands::<1>(line, "free", &args)?;
            Ok(Instruction::Free {
                region: narrow(line, region)?,
            })
        }
        "read" => {
            let [region, offset] = operands::<2>(line, "read", &args)?;
            Ok(Instruction::Read {
                region: narrow(line, region)?,
                offset: narrow(line, offset)?,
            })
        }
        "write" => {
            let [value, region, offset] = operands::<3>(line, "write", &args)?;
            Ok(Instruction::Write {
                value: narrow(line, value)?,
                region: narrow(line, region)?,
                offset: narrow(line, offset)?,
            })
        }
        other => Err(ScriptError::UnknownOp {
            line,
            op: other.to_owned(),
        }),
    }
}

/// Parses a whole script.
///
/// # Errors
///
/// The first malformed line.
pub fn parse(src: &str) -> Result<Vec<Instruction>, ScriptError> {
    src.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = raw.split('#').next().unwrap_or_default().trim();
            (!text.is_empty()).then(|| parse_line(i + 1, text))
        })
        .collect()
}
