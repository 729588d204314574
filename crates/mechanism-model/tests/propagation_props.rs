//! 传播操作的性质测试

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;

fn reduction() -> impl Strategy<Value = f64> {
    prop_oneof![0.1f64..100.0, -100.0f64..-0.1]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_simple_position_roundtrip(r in reduction(), pos in -1e3f64..1e3, vel in -1e2f64..1e2) {
        let xml = SINGLE_REDUCER.replace(
            "<mechanicalReduction>2",
            &format!("<mechanicalReduction>{}", r),
        );
        let (hw, mut state) = robot_state(&xml, &["act1"]);
        {
            let mut hw = hw.write();
            let act = hw.actuator_mut("act1").unwrap();
            act.state.position = pos;
            act.state.velocity = vel;
        }

        state.propagate_actuator_position_to_joint_position();
        hw.write().actuator_mut("act1").unwrap().state.position = 0.0;
        state.propagate_joint_position_to_actuator_position();

        let hw = hw.read();
        let act = hw.actuator("act1").unwrap();
        assert_relative_eq!(act.state.position, pos, epsilon = 1e-9, max_relative = 1e-9);
        assert_relative_eq!(act.state.velocity, vel, epsilon = 1e-9, max_relative = 1e-9);
    }

    #[test]
    fn prop_arm_effort_roundtrip(efforts in prop::array::uniform3(-50.0f64..50.0)) {
        let (_hw, mut state) = robot_state(ARM, &ARM_ACTUATORS);
        for (js, e) in state.joint_states_mut().iter_mut().zip(efforts) {
            js.commanded_effort = e;
        }

        state.propagate_joint_effort_to_actuator_effort();
        state.zero_commands();
        state.propagate_actuator_effort_to_joint_effort();

        for (js, e) in state.joint_states().iter().zip(efforts) {
            assert_relative_eq!(js.commanded_effort, e, epsilon = 1e-9);
        }
    }

    #[test]
    fn prop_effort_is_linear(a in -10.0f64..10.0, b in -10.0f64..10.0) {
        let (hw, mut state) = robot_state(ARM, &ARM_ACTUATORS);
        let mut run = |flex: f64, roll: f64| {
            state.joint_state_mut("wrist_flex").unwrap().commanded_effort = flex;
            state.joint_state_mut("wrist_roll").unwrap().commanded_effort = roll;
            state.propagate_joint_effort_to_actuator_effort();
            let hw = hw.read();
            (
                hw.actuator("wrist_l_motor").unwrap().command.effort,
                hw.actuator("wrist_r_motor").unwrap().command.effort,
            )
        };

        let (la, ra) = run(a, 0.0);
        let (lb, rb) = run(0.0, b);
        let (lab, rab) = run(a, b);
        assert_relative_eq!(lab, la + lb, epsilon = 1e-12);
        assert_relative_eq!(rab, ra + rb, epsilon = 1e-12);
    }

    #[test]
    fn prop_enforce_safety_idempotent(effort in -1e3f64..1e3, pos in -2.0f64..2.0, vel in -5.0f64..5.0) {
        let (_hw, mut state) = robot_state(ARM, &ARM_ACTUATORS);
        {
            let js = state.joint_state_mut("shoulder").unwrap();
            js.calibrated = true;
            js.position = pos;
            js.velocity = vel;
            js.commanded_effort = effort;
        }

        state.enforce_safety();
        let once = state.joint_state("shoulder").unwrap().commanded_effort;
        state.enforce_safety();
        let twice = state.joint_state("shoulder").unwrap().commanded_effort;

        prop_assert_eq!(once, twice);
        prop_assert!(once.abs() <= 30.0);
    }
}
