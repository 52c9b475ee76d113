//! Integration tests for nmsdeploy

mod test_fsm;
mod test_lifecycle;
mod test_orchestrator;
