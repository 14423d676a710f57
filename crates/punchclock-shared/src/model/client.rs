use serde::Deserialize;
use serde_json::{json, Value};

use super::{assign, parse_wire, BaseModel, Model, ModelKind, WireIdentity};
use crate::error::Result;

const MODEL: &str = "client";

/// A customer that projects are grouped under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Client {
    pub(crate) base: BaseModel,
    name: String,
    wid: u64,
}

#[derive(Debug, Deserialize)]
struct ClientJson {
    #[serde(flatten)]
    identity: WireIdentity,
    name: String,
    wid: u64,
}

impl Client {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        assign(&mut self.name, value.into(), &mut self.base.dirty);
    }

    pub fn wid(&self) -> u64 {
        self.wid
    }

    pub fn set_wid(&mut self, value: u64) {
        assign(&mut self.wid, value, &mut self.base.dirty);
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let mut model = Self::default();
        model.load_from_json(value)?;
        Ok(model)
    }
}

impl Model for Client {
    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Client
    }

    fn load_from_json(&mut self, value: &Value) -> Result<()> {
        let wire: ClientJson = parse_wire(MODEL, value)?;
        let meta = wire.identity.resolve(MODEL)?;

        self.base.apply_wire(meta);
        self.set_name(wire.name);
        self.set_wid(wire.wid);
        self.base.clear_dirty();
        Ok(())
    }

    fn to_json(&self) -> Value {
        let mut body = json!({
            "name": self.name,
            "wid": self.wid,
            "guid": self.base.guid(),
        });
        if self.base.id() != 0 {
            body["id"] = json!(self.base.id());
        }
        body
    }
}
