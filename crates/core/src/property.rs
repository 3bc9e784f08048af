use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CoreError, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Normal,
    VariantScoped,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::VariantScoped => "variant",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "normal" => Ok(Self::Normal),
            "variant" => Ok(Self::VariantScoped),
            _ => Err(CoreError::UnknownPropertyKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A named catalog definition: the declared properties of every item built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub name: String,
    pub properties: Vec<PropertyDescriptor>,
}

impl CatalogDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
        self.properties.push(PropertyDescriptor::new(name, kind));
        self
    }

    /// Names of the declared properties of `kind`, in declaration order.
    pub fn property_names(&self, kind: PropertyKind) -> impl Iterator<Item = &str> + '_ {
        self.properties
            .iter()
            .filter(move |p| p.kind == kind)
            .map(|p| p.name.as_str())
    }
}

/// One property slot on a virtual-catalog record.
///
/// `inherited` is the value coming from the base catalog, `local` is the
/// override stored on the virtual item itself. The effective value is the
/// override when one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCell {
    pub inherited: Option<FieldValue>,
    pub local: Option<FieldValue>,
    pub read_only: bool,
}

impl PropertyCell {
    pub fn inherited(value: impl Into<FieldValue>) -> Self {
        Self {
            inherited: Some(value.into()),
            local: None,
            read_only: false,
        }
    }

    pub fn overridden(inherited: impl Into<FieldValue>, local: impl Into<FieldValue>) -> Self {
        Self {
            inherited: Some(inherited.into()),
            local: Some(local.into()),
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn effective(&self) -> Option<&FieldValue> {
        self.local.as_ref().or(self.inherited.as_ref())
    }

    pub fn is_overridden(&self) -> bool {
        self.local.is_some()
    }
}

/// Ordered property map of a category, product, family or variant record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    cells: BTreeMap<String, PropertyCell>,
}

impl PropertyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, cell: PropertyCell) {
        self.cells.insert(name.into(), cell);
    }

    pub fn with(mut self, name: impl Into<String>, cell: PropertyCell) -> Self {
        self.insert(name, cell);
        self
    }

    pub fn effective(&self, name: &str) -> Option<&FieldValue> {
        self.cells.get(name).and_then(PropertyCell::effective)
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.cells.get(name).is_some_and(PropertyCell::is_overridden)
    }

    /// A property is mutable when the record has a slot for it and the slot is not read-only.
    pub fn is_property_mutable(&self, name: &str) -> bool {
        self.cells.get(name).is_some_and(|c| !c.read_only)
    }

    /// Store a local override. Fails for read-only or unknown properties.
    pub fn set_override(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), CoreError> {
        match self.cells.get_mut(name) {
            Some(cell) if cell.read_only => Err(CoreError::InvalidData(format!(
                "property {name} is read-only"
            ))),
            Some(cell) => {
                cell.local = Some(value.into());
                Ok(())
            }
            None => Err(CoreError::InvalidData(format!("unknown property: {name}"))),
        }
    }

    /// Drop the local override so the inherited value shows through.
    /// Returns true if an override was actually removed.
    pub fn clear_override(&mut self, name: &str) -> bool {
        match self.cells.get_mut(name) {
            Some(cell) if !cell.read_only => cell.local.take().is_some(),
            _ => false,
        }
    }

    pub fn overridden_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells
            .iter()
            .filter(|(_, c)| c.is_overridden())
            .map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyCell)> + '_ {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}
