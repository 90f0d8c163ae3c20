//! gdbind bindings check
//!
//! Generates the schema fixture in both file layouts at build time and compiles
//! the result against `gdbind_runtime`, so emitter changes that produce code the
//! runtime cannot satisfy fail the build instead of a user's crate.

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

#[cfg(test)]
mod tests {
    use gdbind_runtime::{
        take_diagnostics, Arguments, CallOutcome, ClassDb, GodotClass, GodotEnum, InitializationLevel,
        Variant, Vector2, Vector2i,
    };

    use super::{buckets, per_type};

    #[test]
    fn test_vector2_constants() {
        use per_type::Vector2Methods;

        assert_eq!(Vector2::ZERO, Vector2::new(0.0, 0.0));
        assert_eq!(Vector2::LEFT, Vector2::new(-1.0, 0.0));
        assert!(Vector2::INF.x.is_infinite() && Vector2::INF.y > 0.0);
    }

    #[test]
    fn test_field_wise_constructor_is_local() {
        use per_type::Vector2Methods;

        take_diagnostics();
        assert_eq!(Vector2::from_x_y(1.5, -2.0), Vector2::new(1.5, -2.0));
        assert!(take_diagnostics().is_empty());
    }

    #[test]
    fn test_engine_calls_without_backend_report() {
        use per_type::Vector2Methods;

        take_diagnostics();
        let converted = Vector2::from_vector2i(Vector2i { x: 1, y: 2 });
        assert_eq!(converted, Vector2::default());
        assert_eq!(per_type::utility::sin(0.5), 0.0);
        assert_eq!(Vector2::ZERO.op_negate(), Vector2::default());

        // Each call reports the missing backend, then the undecodable Nil
        let diagnostics = take_diagnostics();
        assert_eq!(diagnostics.len(), 6);
        assert!(diagnostics[0].starts_with("Error calling `Vector2 constructor 2`"));
        assert!(diagnostics[2].starts_with("Error calling `sin`"));
        assert!(diagnostics[4].starts_with("Error calling `Vector2 unary- Nil`"));
    }

    #[test]
    fn test_class_identity() {
        assert_eq!(<per_type::Node2D as GodotClass>::PARENT_CLASS, Some("CanvasItem"));
        assert_eq!(
            <per_type::EditorPlugin as GodotClass>::INIT_LEVEL,
            InitializationLevel::Editor
        );
        assert_eq!(<buckets::Object as GodotClass>::INIT_LEVEL, InitializationLevel::Core);
        assert!(<per_type::Resource as GodotClass>::REF_COUNTED);
        assert_eq!(per_type::Node::NOTIFICATION_READY, 13);
        assert_eq!(per_type::node::ProcessMode::ALWAYS.to_raw(), 3);
        assert_eq!(buckets::node::ProcessMode::from_raw(2), None);
    }

    #[derive(Default)]
    struct Walker {
        travelled: f64,
    }

    impl per_type::node::NodeVirtual for Walker {
        fn process(&mut self, delta: f64) {
            self.travelled += delta;
        }
    }

    #[test]
    fn test_virtual_dispatch() {
        let mut walker = Walker::default();
        let args = [Variant::Float(0.25)];
        let outcome = per_type::node::dispatch_node_virtual(&mut walker, "_process", &Arguments::new(&args));
        assert_eq!(outcome, CallOutcome::Returned(None));
        assert_eq!(walker.travelled, 0.25);

        let outcome = per_type::node::dispatch_node_virtual(&mut walker, "_draw", &Arguments::new(&[]));
        assert_eq!(outcome, CallOutcome::NotFound);
    }

    #[test]
    fn test_initialize_levels_in_order() {
        per_type::initialize_level(InitializationLevel::Core);
        per_type::initialize_level(InitializationLevel::Scene);
        assert!(ClassDb::is_subclass("Node2D", "Object"));
        assert!(!ClassDb::is_registered("EditorPlugin"));

        per_type::deinitialize_level(InitializationLevel::Scene);
        assert!(!ClassDb::is_registered("Node2D"));
        assert!(ClassDb::is_registered("Object"));
        per_type::deinitialize_level(InitializationLevel::Core);
    }
}
