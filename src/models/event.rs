use serde::{Deserialize, Serialize};

/// Events a realtime client may send, as a tagged union.
///
/// Wire format is a JSON text frame `{"event": "<name>", "data": {...}}`.
/// Every event from one connection flows through a single handler so
/// per-connection ordering and cleanup stay explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The client began a workout.
    WorkoutStarted {
        #[serde(rename = "workoutId")]
        workout_id: i64,
    },
    /// A camera frame to forward to the AI collaborator for form scoring.
    /// The payload (`frame`, `exercise_type`, ...) is relayed verbatim.
    AnalyzeFrame(sonic_rs::Value),
    /// The client finished a workout. Calories/duration are echoed back
    /// in the acknowledgment without server-side recomputation.
    WorkoutCompleted {
        #[serde(rename = "caloriesBurned", default)]
        calories_burned: Option<f64>,
        #[serde(default)]
        duration: Option<f64>,
    },
}

/// Events the bridge sends to realtime clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Broadcast to the `analytics` room when a workout starts.
    WorkoutStarted {
        #[serde(rename = "userId")]
        user_id: i64,
        #[serde(rename = "workoutId")]
        workout_id: i64,
    },
    /// Acknowledgment for `workout_completed`, echoing the client payload.
    WorkoutCompletedAck {
        message: String,
        calories: Option<f64>,
        duration: Option<f64>,
    },
    /// The AI collaborator's form-scoring response, relayed to the
    /// originating connection only.
    FormFeedback(sonic_rs::Value),
    /// Generic analysis failure, relayed to the originating connection only.
    AnalysisError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse_by_name() {
        let started: ClientEvent =
            sonic_rs::from_str(r#"{"event":"workout_started","data":{"workoutId":12}}"#).unwrap();
        assert!(matches!(
            started,
            ClientEvent::WorkoutStarted { workout_id: 12 }
        ));

        let frame: ClientEvent = sonic_rs::from_str(
            r#"{"event":"analyze_frame","data":{"frame":"b64...","exercise_type":"squats"}}"#,
        )
        .unwrap();
        assert!(matches!(frame, ClientEvent::AnalyzeFrame(_)));

        let completed: ClientEvent = sonic_rs::from_str(
            r#"{"event":"workout_completed","data":{"caloriesBurned":320.5,"duration":1800}}"#,
        )
        .unwrap();
        match completed {
            ClientEvent::WorkoutCompleted {
                calories_burned,
                duration,
            } => {
                assert_eq!(calories_burned, Some(320.5));
                assert_eq!(duration, Some(1800.0));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn workout_completed_fields_are_optional() {
        let completed: ClientEvent =
            sonic_rs::from_str(r#"{"event":"workout_completed","data":{}}"#).unwrap();
        assert!(matches!(
            completed,
            ClientEvent::WorkoutCompleted {
                calories_burned: None,
                duration: None,
            }
        ));
    }

    #[test]
    fn server_frames_parse_with_serde_json() {
        // Clients decode frames with their own JSON stack; make sure the
        // emitted shape is plain `{"event", "data"}`.
        let ack = ServerEvent::WorkoutCompletedAck {
            message: "Workout completed successfully!".to_string(),
            calories: None,
            duration: Some(60.0),
        };
        let frame: serde_json::Value =
            serde_json::from_str(&sonic_rs::to_string(&ack).unwrap()).unwrap();
        assert_eq!(frame["event"], "workout_completed_ack");
        assert_eq!(frame["data"]["duration"], 60.0);
        assert!(frame["data"]["calories"].is_null());
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let result: std::result::Result<ClientEvent, _> =
            sonic_rs::from_str(r#"{"event":"shutdown","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn server_events_serialize_with_wire_names() {
        let ack = ServerEvent::WorkoutCompletedAck {
            message: "Workout completed successfully!".to_string(),
            calories: Some(250.0),
            duration: Some(900.0),
        };
        let json = sonic_rs::to_string(&ack).unwrap();
        assert!(json.contains(r#""event":"workout_completed_ack""#));
        assert!(json.contains(r#""calories":250.0"#));

        let err = ServerEvent::AnalysisError {
            message: "Analysis temporarily unavailable".to_string(),
        };
        let json = sonic_rs::to_string(&err).unwrap();
        assert!(json.contains(r#""event":"analysis_error""#));

        let broadcast = ServerEvent::WorkoutStarted {
            user_id: 42,
            workout_id: 7,
        };
        let json = sonic_rs::to_string(&broadcast).unwrap();
        assert!(json.contains(r#""userId":42"#));
        assert!(json.contains(r#""workoutId":7"#));
    }
}
