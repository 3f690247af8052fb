#[derive(Debug)]
pub enum ErrorType {
    Error,
    IOError,
    ConfigError,
    InputFormatError,
    GenerationError,
    ExportError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, new)]
pub struct GcError {
    error_type: ErrorType,
    message: String,
}

pub fn gc_error(message: String) -> GcError {
    GcError::new(ErrorType::Error, message)
}

pub fn io_error(message: String) -> GcError {
    GcError::new(ErrorType::IOError, message)
}

pub fn config_error(message: String) -> GcError {
    GcError::new(ErrorType::ConfigError, message)
}

pub fn input_format_error(message: String) -> GcError {
    GcError::new(ErrorType::InputFormatError, message)
}

pub fn generation_error(message: String) -> GcError {
    GcError::new(ErrorType::GenerationError, message)
}

pub fn export_error(message: String) -> GcError {
    GcError::new(ErrorType::ExportError, message)
}

impl std::fmt::Display for GcError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error_type.to_string(), self.message)
    }
}
