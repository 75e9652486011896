#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use formica_core::commands::HeldKeys;
    use formica_core::constants::*;
    use formica_core::enums::{AgentTask, EntityKind};
    use formica_core::types::{EntityId, GridPos};

    use crate::fsm::{decide, wander_weight, AgentContext, AgentIntent, NeighborCell};
    use crate::jet::{normalize_theta, JetControl};
    use crate::profiles::get_profile;

    fn open_neighbors(at: GridPos) -> Vec<NeighborCell> {
        at.orthogonal_neighbors()
            .into_iter()
            .map(|pos| NeighborCell {
                pos,
                free: true,
                heat: 0.0,
                colony: 0.0,
                light: 0.0,
            })
            .collect()
    }

    fn make_context(task: AgentTask, neighbors: &[NeighborCell]) -> AgentContext<'_> {
        AgentContext {
            kind: EntityKind::Agent,
            task,
            position: GridPos::new(5, 5),
            prev_position: None,
            hp: 10.0,
            prev_hp: 10.0,
            time_on_task_ms: 0.0,
            heat_here: 0.0,
            colony_here: 0.0,
            neighbors,
            enemy: None,
            can_shoot: true,
            max_colony: 300.0,
            max_light: 350.0,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_wander_moves_to_a_free_neighbor() {
        let neighbors = open_neighbors(GridPos::new(5, 5));
        let ctx = make_context(AgentTask::Wander, &neighbors);
        let decision = decide(&ctx, &mut rng());
        assert_eq!(decision.task, AgentTask::Wander);
        assert!(!decision.task_changed);
        match decision.intent {
            AgentIntent::Move(pos) => assert_eq!(pos.distance(&GridPos::new(5, 5)), 1.0),
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn test_boxed_in_agent_idles() {
        let mut neighbors = open_neighbors(GridPos::new(5, 5));
        for n in &mut neighbors {
            n.free = false;
        }
        let ctx = make_context(AgentTask::Wander, &neighbors);
        assert_eq!(decide(&ctx, &mut rng()).intent, AgentIntent::Idle);
    }

    #[test]
    fn test_prev_position_is_avoided() {
        let neighbors = open_neighbors(GridPos::new(5, 5));
        let mut ctx = make_context(AgentTask::Wander, &neighbors);
        ctx.prev_position = Some(GridPos::new(4, 5));
        let weights = get_profile(EntityKind::Agent).wander;
        assert_eq!(neighbors[1].pos, GridPos::new(4, 5));
        assert_eq!(wander_weight(&ctx, &weights, &neighbors[1]), 0.0);
        assert_eq!(wander_weight(&ctx, &weights, &neighbors[0]), 3.0);

        let mut rng = rng();
        for _ in 0..200 {
            let decision = decide(&ctx, &mut rng);
            assert_ne!(decision.intent, AgentIntent::Move(GridPos::new(4, 5)));
        }
    }

    #[test]
    fn test_heat_triggers_flee_to_coolest_cell() {
        let mut neighbors = open_neighbors(GridPos::new(5, 5));
        for (i, n) in neighbors.iter_mut().enumerate() {
            n.heat = 100.0 - i as f64 * 10.0;
        }
        let mut ctx = make_context(AgentTask::Wander, &neighbors);
        ctx.heat_here = 120.0;
        let decision = decide(&ctx, &mut rng());
        assert_eq!(decision.task, AgentTask::Flee);
        assert!(decision.task_changed);
        assert_eq!(decision.intent, AgentIntent::Move(neighbors[3].pos));
    }

    #[test]
    fn test_damage_triggers_flee_and_it_expires() {
        let neighbors = open_neighbors(GridPos::new(5, 5));
        let mut ctx = make_context(AgentTask::Wander, &neighbors);
        ctx.hp = 5.0;
        assert_eq!(decide(&ctx, &mut rng()).task, AgentTask::Flee);

        let mut ctx = make_context(AgentTask::Flee, &neighbors);
        ctx.time_on_task_ms = FLEE_TASK_MS - 1.0;
        assert_eq!(decide(&ctx, &mut rng()).task, AgentTask::Flee);
        ctx.time_on_task_ms = FLEE_TASK_MS;
        assert_eq!(decide(&ctx, &mut rng()).task, AgentTask::Wander);
    }

    #[test]
    fn test_adjacent_enemy_is_shot() {
        let neighbors = open_neighbors(GridPos::new(5, 5));
        let mut ctx = make_context(AgentTask::Wander, &neighbors);
        ctx.enemy = Some((EntityId(9), GridPos::new(5, 6)));
        let decision = decide(&ctx, &mut rng());
        assert_eq!(decision.task, AgentTask::Fight);
        match decision.intent {
            AgentIntent::Shoot { target, theta } => {
                assert_eq!(target, EntityId(9));
                assert!((theta - PI / 2.0).abs() < 1e-9);
            }
            other => panic!("expected a shot, got {other:?}"),
        }

        ctx.can_shoot = false;
        assert_eq!(decide(&ctx, &mut rng()).task, AgentTask::Wander);
    }

    #[test]
    fn test_long_wander_returns_to_colony_uphill() {
        let mut neighbors = open_neighbors(GridPos::new(5, 5));
        neighbors[2].colony = 200.0;
        let mut ctx = make_context(AgentTask::Wander, &neighbors);
        ctx.time_on_task_ms = WANDER_TASK_MS;
        ctx.colony_here = 190.0;
        let decision = decide(&ctx, &mut rng());
        assert_eq!(decision.task, AgentTask::ReturnToColony);
        assert_eq!(decision.intent, AgentIntent::Move(neighbors[2].pos));
    }

    #[test]
    fn test_colony_peak_ends_return() {
        let neighbors = open_neighbors(GridPos::new(5, 5));
        let mut ctx = make_context(AgentTask::ReturnToColony, &neighbors);
        ctx.colony_here = 300.0;
        assert_eq!(decide(&ctx, &mut rng()).task, AgentTask::Wander);
    }

    fn control(theta: f64) -> JetControl {
        JetControl {
            theta,
            thrust: 10.0,
            flipped: false,
            pitch_rate: 0.025,
            thrust_rate: 1.0,
            max_thrust: 50.0,
        }
    }

    #[test]
    fn test_keys_pitch_and_throttle() {
        let keys = HeldKeys {
            up: true,
            right: true,
            ..Default::default()
        };
        let steered = control(1.0).apply_keys(keys);
        assert!((steered.theta - 1.025).abs() < 1e-12);
        assert_eq!(steered.thrust, 11.0);

        let mut flipped = control(1.0);
        flipped.flipped = true;
        let steered = flipped.apply_keys(keys);
        assert!((steered.theta - 0.975).abs() < 1e-12);
        assert_eq!(steered.thrust, 9.0);
    }

    #[test]
    fn test_thrust_is_clamped() {
        let mut jet = control(0.0);
        jet.thrust = 50.0;
        let keys = HeldKeys {
            right: true,
            ..Default::default()
        };
        assert_eq!(jet.apply_keys(keys).thrust, 50.0);
    }

    #[test]
    fn test_pursuit_pitches_toward_target() {
        let up = control(0.1).pursue(GridPos::new(0, 0), GridPos::new(10, 10));
        assert!(up.theta > 0.1);
        let down = control(1.2).pursue(GridPos::new(0, 0), GridPos::new(10, 10));
        assert!(down.theta < 1.2);
    }

    #[test]
    fn test_normalize_theta_wraps() {
        assert!((normalize_theta(-0.5) - (2.0 * PI - 0.5)).abs() < 1e-12);
        assert!((normalize_theta(7.0) - (7.0 - 2.0 * PI)).abs() < 1e-12);
        let wrapped = control(-0.1).normalized();
        assert!(wrapped.theta > 6.0);
    }
}
