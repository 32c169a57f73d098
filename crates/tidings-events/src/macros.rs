//! Declarative schema definitions.

/// Declare an [`EventSchema`](crate::EventSchema) and one marker type per
/// event.
///
/// ```rust
/// use tidings_events::{event_schema, TypedEmitter};
///
/// #[derive(Debug, Clone)]
/// pub struct User {
///     pub id: String,
/// }
///
/// event_schema! {
///     /// Authentication events.
///     pub struct AuthEvents {
///         /// A user signed in.
///         Login("login"): User,
///         /// The current user signed out.
///         Logout("logout"): (),
///     }
/// }
///
/// let events = TypedEmitter::<AuthEvents>::new().unwrap();
/// events.trigger::<Login>(User { id: "u1".into() }).unwrap();
/// events.trigger_empty::<Logout>().unwrap();
/// ```
#[macro_export]
macro_rules! event_schema {
    (
        $(#[$schema_meta:meta])*
        $vis:vis struct $schema:ident {
            $(
                $(#[$event_meta:meta])*
                $event:ident($name:literal): $payload:ty
            ),* $(,)?
        }
    ) => {
        $(#[$schema_meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $schema;

        impl $crate::EventSchema for $schema {
            const EVENT_NAMES: &'static [&'static str] = &[$($name),*];
        }

        $(
            $(#[$event_meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            $vis struct $event;

            impl $crate::Event for $event {
                type Schema = $schema;
                type Payload = $payload;
                const NAME: &'static str = $name;
            }
        )*
    };
}
