use serde::Deserialize;
use serde_json::{json, Value};

use super::{assign, parse_wire, BaseModel, Model, ModelKind, WireIdentity};
use crate::error::Result;

const MODEL: &str = "workspace";

/// A workspace the user belongs to. Workspaces are owned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    pub(crate) base: BaseModel,
    name: String,
    premium: bool,
}

#[derive(Debug, Deserialize)]
struct WorkspaceJson {
    #[serde(flatten)]
    identity: WireIdentity,
    name: String,
    #[serde(default)]
    premium: Option<bool>,
}

impl Workspace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        assign(&mut self.name, value.into(), &mut self.base.dirty);
    }

    pub fn premium(&self) -> bool {
        self.premium
    }

    pub fn set_premium(&mut self, value: bool) {
        assign(&mut self.premium, value, &mut self.base.dirty);
    }

    /// Build a clean workspace from its wire shape.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut model = Self::default();
        model.load_from_json(value)?;
        Ok(model)
    }
}

impl Model for Workspace {
    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Workspace
    }

    fn load_from_json(&mut self, value: &Value) -> Result<()> {
        let wire: WorkspaceJson = parse_wire(MODEL, value)?;
        let meta = wire.identity.resolve(MODEL)?;

        self.base.apply_wire(meta);
        self.set_name(wire.name);
        self.set_premium(wire.premium.unwrap_or(false));
        self.base.clear_dirty();
        Ok(())
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.base.id(),
            "name": self.name,
            "premium": self.premium,
        })
    }
}
