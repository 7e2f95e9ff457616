//! Compiled program image.
//!
//! The image is produced by an external compiler, assembled here through
//! [`ImageBuilder`], and is read-only once a run starts. Every index coming
//! from bytecode is checked against the tables below at the point of use.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(feature = "std")]
use std::collections::HashMap;
#[cfg(not(feature = "std"))]
use hashbrown::HashMap;

use core::fmt;

use crate::value::Value;

/// Upper bound on any image table; indices travel as 32-bit handle payloads
/// but compiled images address them with 16 bits.
pub const MAX_TABLE_LEN: usize = u16::MAX as usize;

/// A declared role: a named binding point for a bus service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDecl {
    pub name: String,
    pub service_class: u32,
}

/// Function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub num_locals: u16,
    pub num_params: u16,
    pub code: Vec<u8>,
}

impl Function {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            num_locals: 0,
            num_params: 0,
            code: Vec::new(),
        }
    }

    pub fn with_code(name: &str, num_locals: u16, num_params: u16, code: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            num_locals,
            num_params,
            code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    DuplicateRole(String),
    TableFull(&'static str),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::DuplicateRole(name) => write!(f, "duplicate role: {}", name),
            ImageError::TableFull(table) => write!(f, "too many entries in {} table", table),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ImageError {}

/// The immutable compiled program.
#[derive(Debug, Clone, Default)]
pub struct Image {
    num_globals: u16,
    strings: Vec<Vec<u8>>,
    floats: Vec<f64>,
    roles: Vec<RoleDecl>,
    role_index: HashMap<String, u32>,
    functions: Vec<Function>,
}

impl Image {
    pub fn builder() -> ImageBuilder {
        ImageBuilder::new()
    }

    #[inline]
    pub fn num_globals(&self) -> usize {
        self.num_globals as usize
    }

    #[inline]
    pub fn num_strings(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn string(&self, idx: u32) -> Option<&[u8]> {
        self.strings.get(idx as usize).map(Vec::as_slice)
    }

    #[inline]
    pub fn num_floats(&self) -> usize {
        self.floats.len()
    }

    /// Float literal as a value; NaN literals become the `Nan` sentinel.
    #[inline]
    pub fn float(&self, idx: u32) -> Option<Value> {
        self.floats.get(idx as usize).map(|&f| Value::from_f64(f))
    }

    #[inline]
    pub fn num_roles(&self) -> usize {
        self.roles.len()
    }

    #[inline]
    pub fn role(&self, idx: u32) -> Option<&RoleDecl> {
        self.roles.get(idx as usize)
    }

    pub fn role_by_name(&self, name: &str) -> Option<u32> {
        self.role_index.get(name).copied()
    }

    #[inline]
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    #[inline]
    pub fn function(&self, idx: u32) -> Option<&Function> {
        self.functions.get(idx as usize)
    }

    pub fn function_by_name(&self, name: &str) -> Option<u32> {
        self.functions.iter().position(|f| f.name == name).map(|i| i as u32)
    }
}

/// Incrementally assembles an [`Image`].
#[derive(Debug, Default)]
pub struct ImageBuilder {
    image: Image,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn globals(mut self, n: u16) -> Self {
        self.image.num_globals = n;
        self
    }

    /// Add a string/buffer constant, returning its index.
    pub fn add_string(&mut self, bytes: impl Into<Vec<u8>>) -> Result<u32, ImageError> {
        push_checked(&mut self.image.strings, bytes.into(), "string")
    }

    pub fn add_float(&mut self, v: f64) -> Result<u32, ImageError> {
        push_checked(&mut self.image.floats, v, "float")
    }

    pub fn add_role(&mut self, name: &str, service_class: u32) -> Result<u32, ImageError> {
        if self.image.role_index.contains_key(name) {
            return Err(ImageError::DuplicateRole(name.into()));
        }
        let idx = push_checked(
            &mut self.image.roles,
            RoleDecl { name: name.into(), service_class },
            "role",
        )?;
        self.image.role_index.insert(name.into(), idx);
        Ok(idx)
    }

    pub fn add_function(&mut self, func: Function) -> Result<u32, ImageError> {
        push_checked(&mut self.image.functions, func, "function")
    }

    pub fn build(self) -> Image {
        self.image
    }
}

fn push_checked<T>(table: &mut Vec<T>, item: T, name: &'static str) -> Result<u32, ImageError> {
    if table.len() >= MAX_TABLE_LEN {
        return Err(ImageError::TableFull(name));
    }
    table.push(item);
    Ok((table.len() - 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tables() {
        let mut b = Image::builder().globals(3);
        assert_eq!(b.add_string(&b"hello"[..]).unwrap(), 0);
        assert_eq!(b.add_string(&b""[..]).unwrap(), 1);
        assert_eq!(b.add_float(2.5).unwrap(), 0);
        assert_eq!(b.add_float(f64::NAN).unwrap(), 1);
        assert_eq!(b.add_role("btn", 0x1473a263).unwrap(), 0);
        assert_eq!(b.add_role("led", 0x1e3048f8).unwrap(), 1);
        assert_eq!(b.add_function(Function::new("main")).unwrap(), 0);
        let img = b.build();

        assert_eq!(img.num_globals(), 3);
        assert_eq!(img.string(0), Some(&b"hello"[..]));
        assert_eq!(img.string(2), None);
        assert_eq!(img.float(0), Some(Value::Double(2.5)));
        assert_eq!(img.float(1), Some(Value::Nan));
        assert_eq!(img.float(2), None);
        assert_eq!(img.role_by_name("led"), Some(1));
        assert_eq!(img.role(0).map(|r| r.service_class), Some(0x1473a263));
        assert_eq!(img.function_by_name("main"), Some(0));
        assert_eq!(img.function_by_name("nope"), None);
    }

    #[test]
    fn test_duplicate_role() {
        let mut b = ImageBuilder::new();
        b.add_role("btn", 1).unwrap();
        assert_eq!(b.add_role("btn", 2), Err(ImageError::DuplicateRole("btn".into())));
        assert_eq!(b.build().num_roles(), 1);
    }
}
