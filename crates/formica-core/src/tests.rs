#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::config::SimConfig;
    use crate::enums::*;
    use crate::events::SimEvent;
    use crate::profiles::Registry;
    use crate::types::{close_to, make_vector, vector_theta, EntityId, GridBounds, GridPos};

    #[test]
    fn test_grid_pos_encode_decode() {
        let pos = GridPos::new(12, -3);
        assert_eq!(pos.encode(), "12,-3");
        assert_eq!(GridPos::decode("12,-3").unwrap(), pos);
        assert_eq!(" 4, 5".parse::<GridPos>().unwrap(), GridPos::new(4, 5));
    }

    #[test]
    fn test_grid_pos_decode_rejects_malformed_keys() {
        for key in ["", "1", "1;2", "a,b", "1,2,3"] {
            assert!(GridPos::decode(key).is_err(), "{key:?} should not decode");
        }
    }

    #[test]
    fn test_grid_pos_as_json_map_key() {
        let mut layer = BTreeMap::new();
        layer.insert(GridPos::new(1, 2), 5.0);
        layer.insert(GridPos::new(-1, 0), 2.5);

        let json = serde_json::to_string(&layer).unwrap();
        assert!(json.contains("\"1,2\":5.0"));

        let back: BTreeMap<GridPos, f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn test_grid_bounds_footprint() {
        let bounds = GridBounds::new(10, 10);
        assert!(bounds.contains_footprint(GridPos::new(7, 7), 3, 3));
        assert!(!bounds.contains_footprint(GridPos::new(8, 7), 3, 3));
        assert!(!bounds.contains(GridPos::new(-1, 0)));
    }

    #[test]
    fn test_vector_helpers() {
        let v = make_vector(0.5, 2.0);
        assert!((v.length() - 2.0).abs() < 1e-12);
        assert!((vector_theta(v) - 0.5).abs() < 1e-12);
        assert!(close_to(0.5 + std::f64::consts::TAU, 0.5));
        assert!(!close_to(0.5, 0.6));
    }

    #[test]
    fn test_every_kind_has_profile_and_valid_timings() {
        let registry = Registry::standard();
        for kind in EntityKind::ALL {
            let profile = registry.entity(kind);
            assert_eq!(profile.kind, kind);
            assert!(profile.width > 0 && profile.height > 0);
            for (action, timing) in &profile.actions {
                assert!(
                    timing.effect_index <= timing.duration,
                    "{kind:?} {action:?} effect index past its duration"
                );
            }
            assert!(
                registry.action_timing(kind, ActionKind::Die).is_some(),
                "{kind:?} cannot die"
            );
        }
    }

    #[test]
    fn test_capability_profiles_match_tags() {
        let registry = Registry::standard();
        for kind in EntityKind::ALL {
            let p = registry.entity(kind);
            assert_eq!(p.jet.is_some(), p.has_tag(Tag::Jet), "{kind:?}");
            assert_eq!(p.tower.is_some(), p.has_tag(Tag::Tower), "{kind:?}");
            assert_eq!(p.ballistic.is_some(), p.has_tag(Tag::Ballistic), "{kind:?}");
            assert_eq!(p.flammable.is_some(), p.has_tag(Tag::Flammable), "{kind:?}");
            assert_eq!(p.explosive.is_some(), p.has_tag(Tag::Explosive), "{kind:?}");
            assert_eq!(
                p.emitter.is_some(),
                p.has_tag(Tag::PheromoneEmitter),
                "{kind:?}"
            );
            assert!(!p.has_tag(Tag::Actor), "Actor is never a static capability");
        }
    }

    #[test]
    fn test_pheromone_profiles() {
        let registry = Registry::standard();
        let light = registry.pheromone(PheromoneKind::Light);
        assert_eq!(light.max_quantity, 350.0);
        assert!(!light.is_dispersing);
        let heat = registry.pheromone(PheromoneKind::Heat);
        assert!(heat.is_dispersing);
        assert_eq!(heat.decay_amount, 15.0);
        assert!(heat.blocking_types.contains(&EntityKind::Dirt));
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config = SimConfig::from_json_str(r#"{ "seed": 7, "grid_width": 64 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.grid_width, 64);
        assert_eq!(config.grid_height, SimConfig::default().grid_height);
        assert_eq!(config.worker_mode, WorkerMode::Threaded);
    }

    #[test]
    fn test_config_rejects_bad_json() {
        assert!(SimConfig::from_json_str("{ seed: }").is_err());
    }

    #[test]
    fn test_event_serde_is_tagged() {
        let event = SimEvent::Ignited { id: EntityId(9) };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Ignited\""));
        let back: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
