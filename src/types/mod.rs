//! Core Domain Types
//!
//! Error taxonomy and the request/record types shared by every module.

pub mod error;
pub mod request;

pub use error::{LicitaError, Result};
pub use request::{
    DocumentType, FieldValue, GeneratedRecord, RequestContext, RiskItem, RiskLevel,
    data_por_extenso,
};

pub(crate) use request::strip_accents;
