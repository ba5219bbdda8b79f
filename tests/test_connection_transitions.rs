use guarantor_notify::domain::entities::{
    validate_transition, ConnectionState, Route, SessionContext, TransitionError,
};

#[test]
fn test_all_valid_transitions_pass() {
    use ConnectionState::*;

    // Normal connect
    assert!(validate_transition(Disconnected, Connecting).is_ok());
    assert!(validate_transition(Connecting, Connected).is_ok());

    // Loss and retry
    assert!(validate_transition(Connected, Reconnecting).is_ok());
    assert!(validate_transition(Connecting, Reconnecting).is_ok());
    assert!(validate_transition(Reconnecting, Connecting).is_ok());

    // Reopen after teardown
    assert!(validate_transition(Closed, Connecting).is_ok());

    // Teardown from anywhere
    for from in [Disconnected, Connecting, Connected, Reconnecting, Closed] {
        assert!(validate_transition(from, Closed).is_ok());
    }

    // Same state (should be allowed)
    for state in [Disconnected, Connecting, Connected, Reconnecting, Closed] {
        assert!(validate_transition(state, state).is_ok());
    }
}

#[test]
fn test_all_invalid_transitions_fail() {
    use ConnectionState::*;

    // Open must be preceded by a connect attempt
    assert!(validate_transition(Disconnected, Connected).is_err());
    assert!(validate_transition(Closed, Connected).is_err());
    assert!(validate_transition(Reconnecting, Connected).is_err());

    // Retrying requires an attempt that failed
    assert!(validate_transition(Disconnected, Reconnecting).is_err());
    assert!(validate_transition(Closed, Reconnecting).is_err());

    // Nothing returns to the initial state
    assert!(validate_transition(Connected, Disconnected).is_err());
    assert!(validate_transition(Closed, Disconnected).is_err());

    assert!(validate_transition(Connected, Connecting).is_err());
}

#[test]
fn test_transition_error_names_both_states() {
    let err = validate_transition(ConnectionState::Closed, ConnectionState::Connected).unwrap_err();

    assert_eq!(
        err,
        TransitionError::InvalidTransition {
            from: ConnectionState::Closed,
            to: ConnectionState::Connected,
        }
    );
    assert!(err.to_string().contains("Closed"));
    assert!(err.to_string().contains("Connected"));
}

#[test]
fn test_eligibility_matrix() {
    let token = Some("tok".to_string());

    let eligible = [Route::Home, Route::Notifications];
    for route in eligible {
        assert!(SessionContext::new(token.clone(), route.clone()).is_eligible());
        assert!(!SessionContext::new(None, route).is_eligible());
    }

    let ineligible = [
        Route::LoanDetails("301".to_string()),
        Route::Other("/profile".to_string()),
    ];
    for route in ineligible {
        assert!(!SessionContext::new(token.clone(), route).is_eligible());
    }
}
