//! FSM unit tests

use nmsdeploy::deploy::fsm::{StackEvent, StackFsm, StackState};

#[test]
fn test_fsm_initial_state() {
    let fsm = StackFsm::default();
    assert_eq!(fsm.state(), StackState::Absent);
    assert!(!fsm.is_terminal());
}

#[test]
fn test_fsm_reconfigure_round_trip() {
    let mut fsm = StackFsm::new(StackState::Installed);

    // Installed -> Reconfiguring
    assert_eq!(fsm.process(StackEvent::Reconfigure), Ok(StackState::Reconfiguring));

    // A second reconfigure cannot start mid-flight
    assert!(fsm.process(StackEvent::Reconfigure).is_err());

    // Reconfiguring -> Installed
    assert_eq!(fsm.process(StackEvent::ReconfigureDone), Ok(StackState::Installed));
}

#[test]
fn test_fsm_uninstalled_is_terminal() {
    let mut fsm = StackFsm::new(StackState::Installed);
    fsm.process(StackEvent::Uninstall).unwrap();
    assert!(fsm.is_terminal());

    for event in [
        StackEvent::Install,
        StackEvent::Reconfigure,
        StackEvent::ReconfigureDone,
        StackEvent::Uninstall,
    ] {
        assert!(fsm.process(event).is_err());
    }
}

#[test]
fn test_fsm_cannot_install_twice() {
    let mut fsm = StackFsm::default();
    fsm.process(StackEvent::Install).unwrap();

    let result = fsm.process(StackEvent::Install);
    assert!(result.is_err());
    assert_eq!(fsm.state(), StackState::Installed);
}
