//! # Display Session
//!
//! Everything a display knows about one provider: the object registry, the
//! uploaded resources, the widget tree built from the current view and the
//! root binding object.
//!
//! ## Message Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SESSION TICK                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  frame ─> ProviderMessage ─> objects / resources / tree      │
//! │                                                              │
//! │  update_layout: bindings ─> wanted sizes ─> bounds           │
//! │  paint:         tree ─> WidgetPainter                        │
//! │  pointer:       tree ─> outbox (eventCallback,               │
//! │                                 propertyChanged)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Frame decode errors are returned to the caller, which tears the connection
//! down. Every other error is logged and the message becomes a no-op.

use std::collections::HashMap;

use farsight_net::{DisplayMessage, ProviderMessage, ResourceCache};
use farsight_shared::{
    ConversionOptions, EventId, FarsightError, FarsightResult, ObjectId, ObjectRef, ObjectRegistry, PropertyName,
    Rect, ResourceId, ResourceKind, Value, WidgetName,
};
use farsight_ui::{PointerEvent, Resource, TextMeasure, WidgetContext, WidgetPainter, WidgetTree};
use tracing::{debug, error, warn};

/// Objects, resources and outgoing notifications of one session.
#[derive(Debug, Default)]
struct SessionState {
    objects: ObjectRegistry,
    resources: HashMap<ResourceId, Resource>,
    options: ConversionOptions,
    outbox: Vec<DisplayMessage>,
}

impl WidgetContext for SessionState {
    fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    fn objects_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    fn conversion_options(&self) -> ConversionOptions {
        self.options
    }

    fn trigger_event(&mut self, event: EventId, widget: WidgetName) {
        debug!("Queue eventCallback {event} from {widget}");
        self.outbox.push(DisplayMessage::EventCallback { event, widget });
    }

    fn trigger_property_changed(&mut self, object: ObjectId, name: PropertyName, value: Value) {
        debug!("Queue propertyChanged {object}.{name}");
        self.outbox.push(DisplayMessage::PropertyChanged { object, name, value });
    }
}

/// The display side of a provider connection.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    tree: WidgetTree,
    root: ObjectRef,
    view: Option<ResourceId>,
    screen: Rect,
}

impl Session {
    /// Creates an empty session for a screen of the given size.
    #[must_use]
    pub fn new(screen: Rect, options: ConversionOptions) -> Self {
        Self {
            state: SessionState {
                options,
                ..SessionState::default()
            },
            tree: WidgetTree::new(),
            root: ObjectRef::NULL,
            view: None,
            screen,
        }
    }

    /// Decodes every resource held by the handshake cache.
    ///
    /// Resources that fail to decode are logged and skipped.
    pub fn load_cache(&mut self, cache: &ResourceCache) {
        for (id, stored) in cache.iter() {
            self.store_resource(id, stored.kind, &stored.data);
        }
        debug!("Loaded {} cached resources", self.state.resources.len());
    }

    /// Decodes one frame and applies it.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the frame is malformed. The stream is
    /// desynchronized at that point and the connection must be closed.
    /// Application errors are logged and swallowed.
    pub fn handle_frame(&mut self, frame: &[u8]) -> FarsightResult<()> {
        let result = ProviderMessage::decode(frame).and_then(|message| self.apply(message));
        Self::settle(result)
    }

    /// Applies one decoded message.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned, see [`Session::handle_frame`].
    pub fn dispatch(&mut self, message: ProviderMessage) -> FarsightResult<()> {
        let result = self.apply(message);
        Self::settle(result)
    }

    fn settle(result: FarsightResult<()>) -> FarsightResult<()> {
        match result {
            Err(e) if e.is_fatal() => {
                error!("Malformed provider frame: {e}");
                Err(e)
            }
            Err(e) => {
                warn!("Ignoring provider message: {e}");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn apply(&mut self, message: ProviderMessage) -> FarsightResult<()> {
        match message {
            ProviderMessage::UploadResource { id, kind, data } => {
                self.store_resource(id, kind, &data);
                if kind == ResourceKind::Layout && self.view == Some(id) {
                    self.set_view(id)?;
                }
                Ok(())
            }
            ProviderMessage::AddOrUpdateObject(object) => {
                debug!("addOrUpdateObject {} ({} properties)", object.id(), object.len());
                self.state.objects.add_or_update(object);
                Ok(())
            }
            ProviderMessage::RemoveObject(id) => {
                if self.state.objects.remove(id).is_none() {
                    debug!("removeObject {id}: not present");
                }
                Ok(())
            }
            ProviderMessage::SetView(id) => self.set_view(id),
            ProviderMessage::SetRoot(id) => {
                debug!("setRoot {id}");
                self.root = ObjectRef::new(id);
                Ok(())
            }
            ProviderMessage::SetProperty { object, name, value } => {
                self.state.objects.require_mut(object)?.set(name, value)
            }
            ProviderMessage::Clear { object, name } => self.state.objects.require_mut(object)?.clear_list(name),
            ProviderMessage::InsertRange {
                object,
                name,
                index,
                items,
            } => {
                let refs: Vec<ObjectRef> = items.into_iter().map(ObjectRef::new).collect();
                self.state
                    .objects
                    .require_mut(object)?
                    .insert_range(name, index as usize, &refs)
            }
            ProviderMessage::RemoveRange {
                object,
                name,
                index,
                count,
            } => self
                .state
                .objects
                .require_mut(object)?
                .remove_range(name, index as usize, count as usize),
            ProviderMessage::MoveRange {
                object,
                name,
                from,
                to,
                count,
            } => self
                .state
                .objects
                .require_mut(object)?
                .move_range(name, from as usize, to as usize, count as usize),
            ProviderMessage::Unknown(tag) => {
                debug!("Skipping message with unknown tag {tag}");
                Ok(())
            }
        }
    }

    fn store_resource(&mut self, id: ResourceId, kind: ResourceKind, data: &[u8]) {
        match Resource::decode(kind, data) {
            Ok(resource) => {
                debug!("Stored {kind:?} resource {id} ({} bytes)", data.len());
                self.state.resources.insert(id, resource);
            }
            Err(e) => warn!("Dropping resource {id}: {e}"),
        }
    }

    /// Replaces the whole widget tree with one built from `layout`.
    ///
    /// The current tree stays in place if `layout` cannot be built. Decode
    /// errors inside the resource are reported as `InvalidLayout`: the frame
    /// itself was well-formed.
    fn set_view(&mut self, layout: ResourceId) -> FarsightResult<()> {
        let mut tree = WidgetTree::new();
        let root = tree.instantiate(&self.state, layout).map_err(|e| {
            if e.is_fatal() {
                FarsightError::InvalidLayout(format!("resource {layout}: {e}"))
            } else {
                e
            }
        })?;
        tree.set_root(Some(root));
        debug!("setView {layout}: {} widgets", tree.len());
        self.tree = tree;
        self.view = Some(layout);
        Ok(())
    }

    /// Resolves bindings and lays the tree out on the screen.
    pub fn update_layout(&mut self, metrics: &dyn TextMeasure) {
        self.tree.update_bindings(&self.state, self.root);
        self.tree.update_layout(&mut self.state, metrics, self.screen);
    }

    /// Paints the tree.
    pub fn paint(&self, painter: &mut dyn WidgetPainter) {
        self.tree.paint(&self.state, painter);
    }

    /// Routes a pointer event. Returns true if a widget handled it.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        self.tree.dispatch_pointer(&mut self.state, event)
    }

    /// Takes the queued display messages in the order they were raised.
    pub fn take_outbox(&mut self) -> Vec<DisplayMessage> {
        std::mem::take(&mut self.state.outbox)
    }

    /// Changes the screen rectangle used by the next layout.
    pub fn set_screen(&mut self, screen: Rect) {
        self.screen = screen;
    }

    /// The screen rectangle.
    #[must_use]
    pub const fn screen(&self) -> Rect {
        self.screen
    }

    /// The object registry.
    #[must_use]
    pub fn objects(&self) -> &ObjectRegistry {
        &self.state.objects
    }

    /// Looks up a stored resource.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.state.resources.get(&id)
    }

    /// Number of stored resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.state.resources.len()
    }

    /// The widget tree of the current view.
    #[must_use]
    pub const fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    /// The root binding object.
    #[must_use]
    pub const fn root(&self) -> ObjectRef {
        self.root
    }

    /// The layout resource currently shown.
    #[must_use]
    pub const fn view(&self) -> Option<ResourceId> {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farsight_shared::{Object, UiType, WidgetType};
    use farsight_ui::{FixedMetrics, LayoutWriter};

    const ITEMS: PropertyName = PropertyName(1);
    const TITLE: PropertyName = PropertyName(2);

    fn session() -> Session {
        Session::new(Rect::new(0, 0, 320, 240), ConversionOptions::default())
    }

    fn list_owner(ids: &[u32]) -> Object {
        let mut object = Object::new(ObjectId(1));
        object
            .add_value(ITEMS, Value::object_list(ids.iter().copied().map(ObjectId)))
            .unwrap();
        object.add_value(TITLE, Value::from("title")).unwrap();
        object
    }

    fn list(session: &Session) -> Vec<u32> {
        match &session.objects().get(ObjectId(1)).unwrap().get(ITEMS).unwrap().value {
            Value::ObjectList(items) => items.iter().map(|item| item.id.raw()).collect(),
            other => panic!("not a list: {other:?}"),
        }
    }

    #[test]
    fn test_set_property_rejects_type_change() {
        let mut session = session();
        session
            .dispatch(ProviderMessage::AddOrUpdateObject(list_owner(&[])))
            .unwrap();
        session
            .dispatch(ProviderMessage::SetProperty {
                object: ObjectId(1),
                name: TITLE,
                value: Value::Integer(3),
            })
            .unwrap();
        let title = session.objects().get(ObjectId(1)).unwrap().get(TITLE).unwrap();
        assert_eq!(title.ty, UiType::String);
        assert_eq!(title.value, Value::from("title"));
    }

    #[test]
    fn test_list_operations() {
        let mut session = session();
        session
            .dispatch(ProviderMessage::AddOrUpdateObject(list_owner(&[10, 11, 12])))
            .unwrap();

        session
            .dispatch(ProviderMessage::InsertRange {
                object: ObjectId(1),
                name: ITEMS,
                index: 99,
                items: vec![ObjectId(13)],
            })
            .unwrap();
        assert_eq!(list(&session), vec![10, 11, 12, 13]);

        session
            .dispatch(ProviderMessage::MoveRange {
                object: ObjectId(1),
                name: ITEMS,
                from: 0,
                to: 2,
                count: 2,
            })
            .unwrap();
        assert_eq!(list(&session), vec![12, 13, 10, 11]);

        session
            .dispatch(ProviderMessage::RemoveRange {
                object: ObjectId(1),
                name: ITEMS,
                index: 3,
                count: 10,
            })
            .unwrap();
        assert_eq!(list(&session), vec![12, 13, 10]);

        session
            .dispatch(ProviderMessage::Clear {
                object: ObjectId(1),
                name: ITEMS,
            })
            .unwrap();
        assert!(list(&session).is_empty());
    }

    #[test]
    fn test_clear_on_non_list_is_ignored() {
        let mut session = session();
        session
            .dispatch(ProviderMessage::AddOrUpdateObject(list_owner(&[])))
            .unwrap();
        session
            .dispatch(ProviderMessage::Clear {
                object: ObjectId(1),
                name: TITLE,
            })
            .unwrap();
        let title = session.objects().get(ObjectId(1)).unwrap().get(TITLE).unwrap();
        assert_eq!(title.value, Value::from("title"));
    }

    #[test]
    fn test_unknown_object_is_not_fatal() {
        let mut session = session();
        assert!(session
            .dispatch(ProviderMessage::SetProperty {
                object: ObjectId(42),
                name: TITLE,
                value: Value::from("x"),
            })
            .is_ok());
        assert!(session.dispatch(ProviderMessage::RemoveObject(ObjectId(42))).is_ok());
    }

    #[test]
    fn test_truncated_frame_is_fatal() {
        let mut session = session();
        let frame = ProviderMessage::SetRoot(ObjectId(300)).encode();
        let err = session.handle_frame(&frame[..frame.len() - 1]).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_set_view_builds_tree() {
        let mut session = session();
        let mut layout = LayoutWriter::new();
        layout.begin(WidgetType::Stack).begin(WidgetType::Button).end().end();
        session
            .dispatch(ProviderMessage::UploadResource {
                id: ResourceId(5),
                kind: ResourceKind::Layout,
                data: layout.finish(),
            })
            .unwrap();

        // Unknown view: logged, nothing changes.
        session.dispatch(ProviderMessage::SetView(ResourceId(6))).unwrap();
        assert!(session.view().is_none());
        assert!(session.tree().is_empty());

        session.dispatch(ProviderMessage::SetView(ResourceId(5))).unwrap();
        assert_eq!(session.view(), Some(ResourceId(5)));
        assert_eq!(session.tree().len(), 2);

        session.update_layout(&FixedMetrics::default());
        let root = session.tree().root().unwrap();
        // Default margins of 4 on the stack.
        assert_eq!(session.tree().get(root).unwrap().actual_bounds(), Rect::new(4, 4, 312, 232));
    }

    #[test]
    fn test_undecodable_bitmap_is_dropped() {
        let mut session = session();
        session
            .dispatch(ProviderMessage::UploadResource {
                id: ResourceId(9),
                kind: ResourceKind::Bitmap,
                data: vec![1, 2, 3],
            })
            .unwrap();
        assert!(session.resource(ResourceId(9)).is_none());
        assert_eq!(session.resource_count(), 0);
    }
}
