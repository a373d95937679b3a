//! Shared fixtures for unit tests.

use serde::{Deserialize, Serialize};

use crate::{specialize_fields, Base, Dynamic, Element, Instance, TypeRegistry};

pub trait Item: Instance {
    fn run(&self) -> Vec<String>;
}

pub struct BaseItem;

impl Base for BaseItem {
    type Object = dyn Item;
    const TYPE_NAME: &'static str = "items.BaseItem";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Item1 {
    pub arg1: String,
}

impl Item for Item1 {
    fn run(&self) -> Vec<String> {
        vec![self.arg1.clone()]
    }
}

impl Element for Item1 {
    const TYPE_NAME: &'static str = "items.Item1";
    const PARENT: Option<&'static str> = Some("items.BaseItem");
}

impl Base for Item1 {
    type Object = dyn Item;
    const TYPE_NAME: &'static str = "items.Item1";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Item2 {
    pub arg1: String,
    pub arg2: String,
}

impl Item for Item2 {
    fn run(&self) -> Vec<String> {
        vec![self.arg1.clone(), self.arg2.clone()]
    }
}

impl Element for Item2 {
    const TYPE_NAME: &'static str = "items.Item2";
    const PARENT: Option<&'static str> = Some("items.Item1");
}

/// Same shape as `Item1`, no declared base.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemX {
    pub arg1: String,
}

impl Item for ItemX {
    fn run(&self) -> Vec<String> {
        vec![self.arg1.clone()]
    }
}

impl Element for ItemX {
    const TYPE_NAME: &'static str = "items.ItemX";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Wrapper {
    pub name: String,
    pub inner: Dynamic<BaseItem>,
}

impl Item for Wrapper {
    fn run(&self) -> Vec<String> {
        let mut out = vec![self.name.clone()];
        if let Some(inner) = self.inner.get() {
            out.extend(inner.run());
        }
        out
    }
}

impl Element for Wrapper {
    const TYPE_NAME: &'static str = "items.Wrapper";
    const PARENT: Option<&'static str> = Some("items.BaseItem");
}

pub trait Sink: Instance {}

/// Claims the item base but is registered in the sink family.
#[derive(Debug, Serialize, Deserialize)]
pub struct Console {
    #[serde(default)]
    pub target: String,
}

impl Sink for Console {}

impl Element for Console {
    const TYPE_NAME: &'static str = "sinks.Console";
    const PARENT: Option<&'static str> = Some("items.BaseItem");
}

specialize_fields!(Item1 { arg1 });
specialize_fields!(Item2 { arg1, arg2 });
specialize_fields!(ItemX { arg1 });
specialize_fields!(Wrapper { name, inner });
specialize_fields!(Console { target });

pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register::<Item1, dyn Item>(|i| i)
        .and_then(|r| r.register::<Item2, dyn Item>(|i| i))
        .and_then(|r| r.register::<ItemX, dyn Item>(|i| i))
        .and_then(|r| r.register::<Wrapper, dyn Item>(|i| i))
        .and_then(|r| r.register::<Console, dyn Sink>(|s| s))
        .unwrap();
    registry
}
