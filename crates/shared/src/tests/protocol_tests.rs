use super::*;

#[test]
fn claim_command_uses_owner_and_color_keys() {
    let owner = Username::parse("Ann").expect("valid");
    let claim = ClaimCommand::new(BlockId(12), &owner, "#6C63FF");
    assert_eq!(
        serde_json::to_value(&claim).expect("encode"),
        serde_json::json!({"id":12,"owner":"Ann","color":"#6C63FF"})
    );
}

#[test]
fn register_response_tolerates_missing_id() {
    let body: RegisterResponse =
        serde_json::from_str(r##"{"color":"#4CAF50"}"##).expect("decode");
    assert_eq!(body.id, None);
    assert_eq!(body.color, "#4CAF50");

    let body: RegisterResponse =
        serde_json::from_str(r##"{"id":"User-17","color":"#2196F3"}"##).expect("decode");
    assert_eq!(body.id.as_deref(), Some("User-17"));
}
