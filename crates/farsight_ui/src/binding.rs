//! # Binding Pass
//!
//! Runs once per tick, root to leaves, before layout.
//!
//! ## Source Resolution
//!
//! ```text
//! bindingContext bound to P, parent source resolves
//!     → parent_source.P if it is an object reference, else parent_source
//! bindingContext literal resolves
//!     → that object
//! otherwise
//!     → parent_source
//! ```
//!
//! ## Repeaters
//!
//! A widget with a `childTemplate` owns one child per element of its
//! `childSource` list. Each child is built from the template and binds to
//! its list element. Children already built from the same template are
//! kept; the rest are rebuilt.

use farsight_shared::{ObjectRef, PropertyId, Value};
use tracing::warn;

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

impl WidgetTree {
    /// Resolves binding sources for the whole tree and expands repeaters.
    pub fn update_bindings(&mut self, ctx: &dyn WidgetContext, root_source: ObjectRef) {
        if let Some(root) = self.root() {
            self.update_widget_bindings(ctx, root, root_source);
        }
    }

    /// Resolves binding sources for one subtree.
    pub fn update_widget_bindings(&mut self, ctx: &dyn WidgetContext, id: WidgetId, parent_source: ObjectRef) {
        let Some(widget) = self.get(id) else {
            return;
        };
        let objects = ctx.objects();

        let context_slot = widget.slot(PropertyId::BindingContext);
        let binding = context_slot.and_then(|slot| slot.binding);
        let literal = match context_slot.map(|slot| &slot.value) {
            Some(Value::Object(target)) => *target,
            _ => ObjectRef::NULL,
        };

        let source = match binding {
            Some(name) if parent_source.is_resolvable(objects) => {
                match parent_source.resolve(objects).and_then(|object| object.get(name)) {
                    Some(property) => match property.value {
                        Value::Object(target) => target,
                        _ => parent_source,
                    },
                    None => parent_source,
                }
            }
            _ if literal.is_resolvable(objects) => literal,
            _ => parent_source,
        };

        let Some(widget) = self.get_mut(id) else {
            return;
        };
        widget.binding_source = source;

        let props = widget.props(ctx);
        let template = props.resource(PropertyId::ChildTemplate);
        if template.is_null() {
            let children = self.children(id).to_vec();
            for child in children {
                self.update_widget_bindings(ctx, child, source);
            }
            return;
        }

        let items = props.object_list(PropertyId::ChildSource);
        self.truncate_children(id, items.len());
        for (index, item) in items.into_iter().enumerate() {
            let existing = self.children(id).get(index).copied();
            let reusable = existing.filter(|&child| self.get(child).is_some_and(|w| w.template_id() == template));
            let child = match reusable {
                Some(child) => child,
                None => match self.instantiate(ctx, template) {
                    Ok(child) => {
                        self.replace_child(id, index, child);
                        child
                    }
                    Err(e) => {
                        warn!("Repeater {id} cannot build item {index} from {template}: {e}");
                        self.truncate_children(id, index);
                        return;
                    }
                },
            };
            self.update_widget_bindings(ctx, child, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LocalContext;
    use crate::resource::Resource;
    use crate::serialize::LayoutWriter;
    use farsight_shared::{Object, ObjectId, PropertyName, ResourceId, WidgetType};

    const ITEMS: PropertyName = PropertyName(1);
    const CHILD: PropertyName = PropertyName(2);
    const CAPTION: PropertyName = PropertyName(3);

    fn object(id: u32, properties: Vec<(PropertyName, Value)>) -> Object {
        let mut object = Object::new(ObjectId(id));
        for (name, value) in properties {
            object.add_value(name, value).unwrap();
        }
        object
    }

    fn item_template() -> Vec<u8> {
        let mut layout = LayoutWriter::new();
        layout.begin(WidgetType::Label).binding(PropertyId::Text, CAPTION);
        layout.finish()
    }

    #[test]
    fn test_binding_context_through_parent() {
        let mut ctx = LocalContext::new();
        ctx.objects.add_or_update(object(1, vec![(CHILD, Value::object(ObjectId(2)))]));
        ctx.objects.add_or_update(object(2, vec![]));

        let mut tree = WidgetTree::new();
        let root = tree.create(WidgetType::Stack);
        let child = tree.create(WidgetType::Label);
        tree.get_mut(child).unwrap().set_binding(PropertyId::BindingContext, CHILD).unwrap();
        tree.append_child(root, child);
        tree.set_root(Some(root));

        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));
        assert_eq!(tree.get(root).unwrap().binding_source(), ObjectRef::new(ObjectId(1)));
        assert_eq!(tree.get(child).unwrap().binding_source(), ObjectRef::new(ObjectId(2)));
    }

    #[test]
    fn test_missing_context_property_falls_back_to_parent() {
        let mut ctx = LocalContext::new();
        ctx.objects.add_or_update(object(1, vec![]));

        let mut tree = WidgetTree::new();
        let root = tree.create(WidgetType::Stack);
        let child = tree.create(WidgetType::Label);
        tree.get_mut(child).unwrap().set_binding(PropertyId::BindingContext, CHILD).unwrap();
        tree.append_child(root, child);
        tree.set_root(Some(root));

        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));
        assert_eq!(tree.get(child).unwrap().binding_source(), ObjectRef::new(ObjectId(1)));
    }

    #[test]
    fn test_literal_context_and_inheritance() {
        let mut ctx = LocalContext::new();
        ctx.objects.add_or_update(object(1, vec![]));
        ctx.objects.add_or_update(object(5, vec![]));

        let mut tree = WidgetTree::new();
        let root = tree.create(WidgetType::Stack);
        let redirected = tree.create(WidgetType::Stack);
        let dangling = tree.create(WidgetType::Stack);
        let leaf = tree.create(WidgetType::Label);
        tree.get_mut(redirected)
            .unwrap()
            .set_literal(PropertyId::BindingContext, Value::object(ObjectId(5)))
            .unwrap();
        tree.get_mut(dangling)
            .unwrap()
            .set_literal(PropertyId::BindingContext, Value::object(ObjectId(77)))
            .unwrap();
        tree.append_child(root, redirected);
        tree.append_child(root, dangling);
        tree.append_child(redirected, leaf);
        tree.set_root(Some(root));

        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));
        assert_eq!(tree.get(redirected).unwrap().binding_source(), ObjectRef::new(ObjectId(5)));
        assert_eq!(tree.get(leaf).unwrap().binding_source(), ObjectRef::new(ObjectId(5)));
        assert_eq!(tree.get(dangling).unwrap().binding_source(), ObjectRef::new(ObjectId(1)));
    }

    fn repeater_fixture(count: u32) -> (LocalContext, WidgetTree, farsight_shared::ResourceId) {
        let template = ResourceId(40);
        let mut ctx = LocalContext::new();
        ctx.insert_resource(template, Resource::Layout(item_template()));
        let ids: Vec<ObjectId> = (0..count).map(|i| ObjectId(10 + i)).collect();
        for &id in &ids {
            ctx.objects.add_or_update(object(id.raw(), vec![(CAPTION, Value::from(format!("item {}", id.raw())))]));
        }
        ctx.objects.add_or_update(object(1, vec![(ITEMS, Value::object_list(ids))]));

        let mut tree = WidgetTree::new();
        let list = tree.create(WidgetType::Stack);
        let widget = tree.get_mut(list).unwrap();
        widget.set_literal(PropertyId::ChildTemplate, Value::Resource(template)).unwrap();
        widget.set_binding(PropertyId::ChildSource, ITEMS).unwrap();
        tree.set_root(Some(list));
        (ctx, tree, template)
    }

    #[test]
    fn test_repeater_builds_one_child_per_item() {
        let (ctx, mut tree, template) = repeater_fixture(3);
        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));

        let root = tree.root().unwrap();
        let children = tree.children(root).to_vec();
        assert_eq!(children.len(), 3);
        for (i, child) in children.iter().enumerate() {
            let widget = tree.get(*child).unwrap();
            assert_eq!(widget.template_id(), template);
            assert_eq!(widget.binding_source(), ObjectRef::new(ObjectId(10 + i as u32)));
            assert_eq!(widget.props(&ctx).string(PropertyId::Text), format!("item {}", 10 + i));
        }
    }

    #[test]
    fn test_repeater_reuses_and_shrinks() {
        let (mut ctx, mut tree, _) = repeater_fixture(3);
        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));
        let root = tree.root().unwrap();
        let first = tree.children(root).to_vec();

        ctx.objects
            .get_mut(ObjectId(1))
            .unwrap()
            .remove_range(ITEMS, 1, 1)
            .unwrap();
        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));

        let second = tree.children(root).to_vec();
        assert_eq!(second, vec![first[0], first[1]]);
        assert_eq!(tree.get(second[1]).unwrap().binding_source(), ObjectRef::new(ObjectId(12)));
        assert!(!tree.contains(first[2]));
    }

    #[test]
    fn test_repeater_with_missing_template() {
        let (mut ctx, mut tree, template) = repeater_fixture(2);
        ctx.resources.remove(&template);
        tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));
        assert!(tree.children(tree.root().unwrap()).is_empty());
    }
}
