//! # Widget Context
//!
//! The seam between the widget engine and whoever owns the session state.
//!
//! Widgets read objects and resources through the context and report user
//! actions back through it. A network session turns those reports into
//! `eventCallback` and `propertyChanged` messages; tests just inspect them.

use std::collections::HashMap;

use farsight_shared::{
    ConversionOptions, EventId, ObjectId, ObjectRegistry, PropertyName, ResourceId, Value, WidgetName,
};
use tracing::debug;

use crate::resource::Resource;

/// Session state the widget engine reads and writes.
pub trait WidgetContext {
    /// The object registry bindings resolve against.
    fn objects(&self) -> &ObjectRegistry;

    /// Mutable registry, used when a bound property is written.
    fn objects_mut(&mut self) -> &mut ObjectRegistry;

    /// Looks up an uploaded resource.
    fn resource(&self, id: ResourceId) -> Option<&Resource>;

    /// Formatting rules for bound property conversions.
    fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions::default()
    }

    /// A widget fired an event callback.
    fn trigger_event(&mut self, event: EventId, widget: WidgetName);

    /// A bound property changed because of user input.
    fn trigger_property_changed(&mut self, object: ObjectId, name: PropertyName, value: Value);
}

/// Something the widget engine wants the provider to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An event callback fired.
    Event {
        /// Callback id.
        event: EventId,
        /// Name of the widget that fired it.
        widget: WidgetName,
    },
    /// A bound property was written.
    PropertyChanged {
        /// Object written.
        object: ObjectId,
        /// Property written.
        name: PropertyName,
        /// New value, in the object's declared type.
        value: Value,
    },
}

/// A context that owns its objects and resources and queues notifications.
#[derive(Debug, Default)]
pub struct LocalContext {
    /// Object registry.
    pub objects: ObjectRegistry,
    /// Uploaded resources.
    pub resources: HashMap<ResourceId, Resource>,
    /// Conversion formatting.
    pub options: ConversionOptions,
    notifications: Vec<Notification>,
}

impl LocalContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces a resource.
    pub fn insert_resource(&mut self, id: ResourceId, resource: Resource) {
        self.resources.insert(id, resource);
    }

    /// Takes all queued notifications in the order they were raised.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Queued notifications.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }
}

impl WidgetContext for LocalContext {
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
        debug!("Event {event} from {widget}");
        self.notifications.push(Notification::Event { event, widget });
    }

    fn trigger_property_changed(&mut self, object: ObjectId, name: PropertyName, value: Value) {
        debug!("Property {name} of {object} changed");
        self.notifications.push(Notification::PropertyChanged { object, name, value });
    }
}
