// sdo.rs - SDO transaction results as handed back by a master driver
use thiserror::Error;
use tokio::sync::oneshot;

/// Reasons an SDO transaction can fail inside the master driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdoError {
    #[error("SDO request timeout")]
    Timeout,
    #[error("SDO abort 0x{code:08X}: {info}")]
    Aborted { code: u32, info: String },
    #[error("SDO channel disconnected")]
    Disconnected,
    #[error("SDO failure: {0}")]
    Unknown(String),
}

impl SdoError {
    /// Build an abort error, filling in the description of the abort code.
    pub fn aborted(code: u32) -> Self {
        Self::Aborted {
            code,
            info: abort_code_description(code),
        }
    }
}

/// Pending result of an asynchronous SDO transaction.
pub type SdoCompletion<T> = oneshot::Receiver<Result<T, SdoError>>;

/// Driver side of an [`SdoCompletion`].
pub type SdoResolver<T> = oneshot::Sender<Result<T, SdoError>>;

/// Create a linked resolver / completion pair for one SDO transaction.
pub fn completion<T>() -> (SdoResolver<T>, SdoCompletion<T>) {
    oneshot::channel()
}

/// Get human-readable description of SDO abort codes
pub fn abort_code_description(code: u32) -> String {
    match code {
        0x05030000 => "Toggle bit not alternated".to_string(),
        0x05040000 => "SDO protocol timed out".to_string(),
        0x05040001 => "Client/server command specifier not valid or unknown".to_string(),
        0x05040005 => "Out of memory".to_string(),
        0x06010000 => "Unsupported access to an object".to_string(),
        0x06010001 => "Attempt to read a write only object".to_string(),
        0x06010002 => "Attempt to write a read only object".to_string(),
        0x06020000 => "Object does not exist in the object dictionary".to_string(),
        0x06040041 => "Object cannot be mapped to the PDO".to_string(),
        0x06040042 => "The number and length of the objects to be mapped would exceed PDO length".to_string(),
        0x06040043 => "General parameter incompatibility reason".to_string(),
        0x06040047 => "General internal incompatibility in the device".to_string(),
        0x06060000 => "Access failed due to a hardware error".to_string(),
        0x06070010 => "Data type does not match, length of service parameter does not match".to_string(),
        0x06070012 => "Data type does not match, length of service parameter too high".to_string(),
        0x06070013 => "Data type does not match, length of service parameter too low".to_string(),
        0x06090011 => "Sub-index does not exist".to_string(),
        0x06090030 => "Value range of parameter exceeded (only for write access)".to_string(),
        0x06090031 => "Value of parameter written too high".to_string(),
        0x06090032 => "Value of parameter written too low".to_string(),
        0x06090036 => "Maximum value is less than minimum value".to_string(),
        0x08000000 => "General error".to_string(),
        0x08000020 => "Data cannot be transferred or stored to the application".to_string(),
        0x08000021 => "Data cannot be transferred or stored to the application because of local control".to_string(),
        0x08000022 => "Data cannot be transferred or stored to the application because of the present device state".to_string(),
        _ => format!("Unknown abort code: 0x{:08X}", code),
    }
}
