//! Wrapped native commands: `90 INS 00 00 [Lc data] 00`.

use crate::error::DecodeError;
use crate::Error;

/// CLA octet of every wrapped native command.
pub const CLA_WRAPPED: u8 = 0x90;

/// Instructions understood by this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instruction {
    GetManufacturingData = 0x60,
    GetApplicationDirectory = 0x6A,
    GetAdditionalFrame = 0xAF,
    SelectApplication = 0x5A,
    GetFiles = 0x6F,
    GetFileSettings = 0xF5,
    ReadValue = 0x6C,
}

impl Instruction {
    /// The opcode transmitted as INS.
    pub fn opcode(self) -> u8 {
        self as u8
    }

    /// Human readable name, as used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::GetManufacturingData => "GET_MANUFACTURING_DATA",
            Self::GetApplicationDirectory => "GET_APPLICATION_DIRECTORY",
            Self::GetAdditionalFrame => "GET_ADDITIONAL_FRAME",
            Self::SelectApplication => "SELECT_APPLICATION",
            Self::GetFiles => "GET_FILES",
            Self::GetFileSettings => "GET_FILE_SETTINGS",
            Self::ReadValue => "READ_VALUE",
        }
    }
}

impl TryFrom<u8> for Instruction {
    type Error = DecodeError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        Ok(match opcode {
            0x60 => Self::GetManufacturingData,
            0x6A => Self::GetApplicationDirectory,
            0xAF => Self::GetAdditionalFrame,
            0x5A => Self::SelectApplication,
            0x6F => Self::GetFiles,
            0xF5 => Self::GetFileSettings,
            0x6C => Self::ReadValue,
            _ => return Err(DecodeError::UnknownInstruction(opcode)),
        })
    }
}

/// A wrapped command to be transmitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    instruction: Instruction,
    parameters: Option<Vec<u8>>,
}

impl CommandFrame {
    /// Constructs a command with the instruction and optional parameters.
    /// Empty parameters are sent without a length octet.
    pub fn build(instruction: Instruction, parameters: Option<Vec<u8>>) -> Result<Self, Error> {
        let parameters = parameters.filter(|p| !p.is_empty());
        if let Some(p) = &parameters {
            if p.len() > u8::MAX as usize {
                return Err(Error::InvalidParameters { len: p.len() });
            }
        }

        Ok(Self {
            instruction,
            parameters,
        })
    }

    /// Constructs a command without parameters.
    pub fn new(instruction: Instruction) -> Self {
        Self {
            instruction,
            parameters: None,
        }
    }

    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    pub fn parameters(&self) -> &[u8] {
        self.parameters.as_deref().unwrap_or_default()
    }

    /// Parses a frame from the octets.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (ins, rest) = match bytes {
            [CLA_WRAPPED, ins, 0x00, 0x00, rest @ ..] => (*ins, rest),
            _ => return Err(DecodeError::MalformedFrame),
        };
        let instruction = Instruction::try_from(ins)?;

        let parameters = match rest {
            [0x00] => None,
            [len, params @ .., 0x00] if *len as usize == params.len() && !params.is_empty() => {
                Some(params.to_vec())
            }
            _ => return Err(DecodeError::MalformedFrame),
        };

        Ok(Self {
            instruction,
            parameters,
        })
    }

    /// Converts the command into octets.
    pub fn into_bytes(self) -> Vec<u8> {
        let Self {
            instruction,
            parameters,
        } = self;

        let mut buffer: Vec<u8> = vec![CLA_WRAPPED, instruction.opcode(), 0x00, 0x00];
        if let Some(mut p) = parameters {
            buffer.push(p.len() as u8);
            buffer.append(&mut p);
        }

        buffer.push(0x00);
        buffer
    }
}

impl From<CommandFrame> for Vec<u8> {
    fn from(command: CommandFrame) -> Self {
        command.into_bytes()
    }
}
