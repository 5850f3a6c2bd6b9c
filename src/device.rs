// Typed view of the station device protocol: named vectors of named
// elements. The transport is an external collaborator behind the trait; a
// missing element is an explicit error, never a null dereference.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("vector {vector} not published by {device}")]
    VectorMissing { device: String, vector: String },

    #[error("element {element} not present in vector {vector}")]
    ElementMissing { vector: String, element: String },
}

/// One element of a device vector. `value` is `None` when the device reports
/// the reading as unavailable; `ok` is the element's status flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub value: Option<f64>,
    pub ok: bool,
}

impl Element {
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

/// A named vector of elements as published by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    pub name: String,
    pub elements: Vec<Element>,
}

impl Vector {
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Float value of a named element; fails if the element is absent.
    pub fn float(&self, name: &str) -> Result<Option<f64>, DeviceError> {
        self.element(name)
            .map(Element::value)
            .ok_or_else(|| DeviceError::ElementMissing {
                vector: self.name.clone(),
                element: name.to_string(),
            })
    }
}

/// Client for the device protocol. Callers own the connection lifecycle and
/// pass the client by reference to whatever needs it.
pub trait DeviceClient {
    fn get_vector(&self, device: &str, vector: &str) -> Result<Vector, DeviceError>;
}
