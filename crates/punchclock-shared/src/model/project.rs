use serde::Deserialize;
use serde_json::{json, Value};

use super::{assign, parse_wire, BaseModel, Model, ModelKind, WireIdentity};
use crate::error::Result;

const MODEL: &str = "project";

/// Display colours indexed by a project's `color` field.
pub const COLOR_CODES: [&str; 15] = [
    "#4dc3ff", "#bc85e6", "#df7baa", "#f68d38", "#b27636", "#8ab734", "#14a88e", "#268bb5",
    "#6668b4", "#a4506c", "#67412c", "#3c6526", "#094558", "#bc2d07", "#999999",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub(crate) base: BaseModel,
    name: String,
    color: String,
    wid: u64,
    cid: u64,
    active: bool,
    billable: bool,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            base: BaseModel::default(),
            name: String::new(),
            color: String::new(),
            wid: 0,
            cid: 0,
            active: true,
            billable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectJson {
    #[serde(flatten)]
    identity: WireIdentity,
    name: String,
    wid: u64,
    #[serde(default)]
    cid: Option<u64>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    billable: Option<bool>,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        assign(&mut self.name, value.into(), &mut self.base.dirty);
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, value: impl Into<String>) {
        assign(&mut self.color, value.into(), &mut self.base.dirty);
    }

    /// Hex colour for the palette index stored in `color`. Unknown or empty
    /// indexes fall back to the first colour.
    pub fn color_code(&self) -> &'static str {
        self.color
            .parse::<usize>()
            .ok()
            .and_then(|index| COLOR_CODES.get(index).copied())
            .unwrap_or(COLOR_CODES[0])
    }

    pub fn wid(&self) -> u64 {
        self.wid
    }

    pub fn set_wid(&mut self, value: u64) {
        assign(&mut self.wid, value, &mut self.base.dirty);
    }

    pub fn cid(&self) -> u64 {
        self.cid
    }

    pub fn set_cid(&mut self, value: u64) {
        assign(&mut self.cid, value, &mut self.base.dirty);
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, value: bool) {
        assign(&mut self.active, value, &mut self.base.dirty);
    }

    pub fn billable(&self) -> bool {
        self.billable
    }

    pub fn set_billable(&mut self, value: bool) {
        assign(&mut self.billable, value, &mut self.base.dirty);
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let mut model = Self::default();
        model.load_from_json(value)?;
        Ok(model)
    }
}

impl Model for Project {
    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Project
    }

    fn load_from_json(&mut self, value: &Value) -> Result<()> {
        let wire: ProjectJson = parse_wire(MODEL, value)?;
        let meta = wire.identity.resolve(MODEL)?;

        self.base.apply_wire(meta);
        self.set_name(wire.name);
        self.set_wid(wire.wid);
        self.set_cid(wire.cid.unwrap_or(0));
        self.set_color(wire.color.unwrap_or_default());
        self.set_active(wire.active.unwrap_or(true));
        self.set_billable(wire.billable.unwrap_or(false));
        self.base.clear_dirty();
        Ok(())
    }

    fn to_json(&self) -> Value {
        let mut body = json!({
            "name": self.name,
            "wid": self.wid,
            "guid": self.base.guid(),
            "color": self.color,
            "active": self.active,
            "billable": self.billable,
        });
        if self.cid != 0 {
            body["cid"] = json!(self.cid);
        }
        if self.base.id() != 0 {
            body["id"] = json!(self.base.id());
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_code_lookup() {
        let mut project = Project::default();
        assert_eq!(project.color_code(), "#4dc3ff");

        project.set_color("5");
        assert_eq!(project.color_code(), "#8ab734");

        project.set_color("99");
        assert_eq!(project.color_code(), "#4dc3ff");
    }

    #[test]
    fn test_optional_fields_default() {
        let project = Project::from_json(&json!({
            "id": 7,
            "guid": "b0d7c2a4-2d1c-4a0e-9ad1-5c55a1b7e0a1",
            "name": "Website",
            "wid": 100,
            "cid": null
        }))
        .unwrap();

        assert_eq!(project.cid(), 0);
        assert!(project.active());
        assert!(!project.billable());
        assert_eq!(project.base().guid(), "b0d7c2a4-2d1c-4a0e-9ad1-5c55a1b7e0a1");
    }

    #[test]
    fn test_wrong_type_aborts_conversion() {
        let result = Project::from_json(&json!({
            "id": 7,
            "name": "Website",
            "wid": "one hundred"
        }));
        assert!(result.is_err());
    }
}
