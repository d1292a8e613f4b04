//! Dispatch scripts for `dynscope dispatch`.
//!
//! A script declares host classes, creates named instances, and runs a
//! sequence of get/set/has/delete/names steps through a
//! [`DynamicDispatcher`] over a [`ReflectBinder`].

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use dynscope_runtime::{
    ClassDef, ClassRegistry, DispatchOptions, DynamicDispatcher, HostMember, ObjectRef,
    ReflectBinder, TypeToken, Value, ValueKind, Visibility,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchScript {
    #[serde(default)]
    pub options: DispatchOptions,
    #[serde(default)]
    pub classes: Vec<ClassDesc>,
    /// Instance name -> class name.
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
    #[serde(default)]
    pub steps: Vec<StepDesc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDesc {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub members: Vec<HostMemberDesc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMemberKindDesc {
    Field,
    /// Read-only property returning `initial`.
    Constant,
    /// Method returning `initial` when called.
    Method,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMemberDesc {
    pub name: String,
    pub kind: HostMemberKindDesc,
    #[serde(default, rename = "type")]
    pub value_kind: ValueKind,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub initial: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDesc {
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Get,
    Set,
    Has,
    Delete,
    Names,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDesc {
    pub op: Op,
    /// Instance name, or class name when `static` is set. Absent means null.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Requesting class.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub name: serde_json::Value,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Outcome of one step: the rendered result, or the error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub op: Op,
    pub result: Result<String, String>,
}

struct Session {
    dispatcher: DynamicDispatcher<ReflectBinder>,
    objects: HashMap<String, ObjectRef>,
}

impl DispatchScript {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse dispatch script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Run every step. Dispatch failures are recorded per step; malformed
    /// scripts (unknown classes or objects) fail the whole run.
    pub fn run(&self) -> Result<Vec<StepOutcome>> {
        let session = self.start()?;
        let outcomes = self
            .steps
            .iter()
            .map(|step| session.execute(step))
            .collect::<Result<Vec<_>>>()?;
        info!(
            steps = outcomes.len(),
            expando_objects = session.dispatcher.side_table().len(),
            "dispatch script finished"
        );
        Ok(outcomes)
    }

    fn start(&self) -> Result<Session> {
        let mut registry = ClassRegistry::new();
        for class in &self.classes {
            let mut def = ClassDef::new(&class.name);
            if let Some(base) = &class.extends {
                let Some(token) = registry.class_by_name(base) else {
                    bail!("class `{}` extends unknown class `{base}`", class.name);
                };
                def = def.extends(token);
            }
            if class.dynamic {
                def = def.dynamic();
            }
            for member in &class.members {
                def = def.member(host_member(member)?);
            }
            registry.define(def)?;
        }

        let mut objects = HashMap::new();
        for object in &self.objects {
            let Some(token) = registry.class_by_name(&object.class) else {
                bail!("object `{}` has unknown class `{}`", object.name, object.class);
            };
            objects.insert(object.name.clone(), registry.instantiate(token)?);
        }

        debug!(
            classes = registry.len(),
            objects = objects.len(),
            "dispatch session ready"
        );
        let binder = ReflectBinder::new(Arc::new(registry));
        Ok(Session {
            dispatcher: DynamicDispatcher::with_options(binder, &self.options),
            objects,
        })
    }
}

impl Session {
    fn execute(&self, step: &StepDesc) -> Result<StepOutcome> {
        let target = self.target(step)?;
        let context = match &step.context {
            Some(name) => Some(self.class(name)?),
            None => None,
        };
        let name = self.value(&step.name)?;
        let d = &self.dispatcher;

        let result = match step.op {
            Op::Get => d.get_member(&target, context, &name).map(|v| v.to_string()),
            Op::Set => {
                let value = self.value(&step.value)?;
                d.set_member(&target, context, &name, value)
                    .map(|()| "ok".to_string())
            }
            Op::Has => d.has_property(&target, context, &name).map(|b| b.to_string()),
            Op::Delete => d.delete_member(&target, &name).map(|b| b.to_string()),
            Op::Names => d
                .dynamic_member_names(&target)
                .map(|names| format!("[{}]", names.join(", "))),
        };
        Ok(StepOutcome {
            op: step.op,
            result: result.map_err(|err| err.to_string()),
        })
    }

    fn target(&self, step: &StepDesc) -> Result<Value> {
        match &step.target {
            None => Ok(Value::Null),
            Some(name) if step.is_static => Ok(Value::Class(self.class(name)?)),
            Some(name) => self
                .objects
                .get(name)
                .cloned()
                .map(Value::Object)
                .with_context(|| format!("unknown object `{name}`")),
        }
    }

    fn class(&self, name: &str) -> Result<TypeToken> {
        self.dispatcher
            .binder()
            .registry()
            .class_by_name(name)
            .with_context(|| format!("unknown class `{name}`"))
    }

    /// JSON scalars map to script values; `{"ref": "obj"}` names an instance.
    fn value(&self, json: &serde_json::Value) -> Result<Value> {
        if let Some(name) = json.get("ref").and_then(serde_json::Value::as_str) {
            return self
                .objects
                .get(name)
                .cloned()
                .map(Value::Object)
                .with_context(|| format!("unknown object `{name}`"));
        }
        scalar(json)
    }
}

fn scalar(json: &serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(n) => Value::Number(n),
            None => bail!("number {n} is out of range"),
        },
        serde_json::Value::String(s) => Value::from(s.as_str()),
        other => bail!("unsupported value {other}"),
    })
}

fn host_member(desc: &HostMemberDesc) -> Result<HostMember> {
    let initial = desc.initial.as_ref().map(scalar).transpose()?;
    let member = match desc.kind {
        HostMemberKindDesc::Field => {
            let field = HostMember::field(&desc.name, desc.value_kind);
            match initial {
                Some(value) => field.with_initial(value),
                None => field,
            }
        }
        HostMemberKindDesc::Constant => {
            let value = initial.unwrap_or_default();
            HostMember::property(&desc.name, move |_| Ok(value.clone()))
        }
        HostMemberKindDesc::Method => {
            let value = initial.unwrap_or_default();
            HostMember::method(&desc.name, move |_, _| Ok(value.clone()))
        }
    };
    let member = member.with_visibility(desc.visibility);
    Ok(if desc.is_static {
        member.into_static()
    } else {
        member
    })
}
