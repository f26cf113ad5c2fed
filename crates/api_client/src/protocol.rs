//! Wire types for the maze server JSON protocol.
//!
//! Every operation is a POST to the one API endpoint with an `action`
//! dispatch field; session-scoped operations attach the `id` obtained from
//! `getUserId`. Numeric fields may arrive as JSON numbers or numeric strings
//! depending on the server build, so decoding accepts both.

use contracts::{MazeLayout, WallSegment};
use serde::{Deserialize, Deserializer, Serialize};

/// Request envelope shared by all operations
#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest<'a> {
    pub action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
}

/// `getUserId` response
#[derive(Debug, Deserialize)]
pub(crate) struct UserIdResponse {
    pub id: String,
}

/// `getMaze` response; walls come as point pairs `[[x1,y1],[x2,y2]]`
#[derive(Debug, Deserialize)]
pub(crate) struct MazeResponse {
    pub size: [u32; 2],
    pub map: Vec<[[f64; 2]; 2]>,
}

impl From<MazeResponse> for MazeLayout {
    fn from(res: MazeResponse) -> Self {
        MazeLayout {
            size: res.size,
            walls: res
                .map
                .into_iter()
                .map(|[from, to]| WallSegment { from, to })
                .collect(),
        }
    }
}

/// `getPosition` response
#[derive(Debug, Deserialize)]
pub(crate) struct PositionResponse {
    pub position: [Flex; 2],
    pub direction: Flex,
}

/// f64 decoded from either a JSON number or a numeric string
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Flex(pub f64);

impl<'de> Deserialize<'de> for Flex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumOrStr {
            Num(f64),
            Str(String),
        }

        match NumOrStr::deserialize(deserializer)? {
            NumOrStr::Num(n) => Ok(Flex(n)),
            NumOrStr::Str(s) => s
                .trim()
                .parse()
                .map(Flex)
                .map_err(|e| serde::de::Error::custom(format!("invalid number '{s}': {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_absent_id() {
        let body = serde_json::to_string(&ApiRequest {
            action: "getUserId",
            id: None,
        })
        .unwrap();
        assert_eq!(body, r#"{"action":"getUserId"}"#);
    }

    #[test]
    fn test_position_accepts_numbers() {
        let res: PositionResponse =
            serde_json::from_str(r#"{"position": [5.0, 6.5], "direction": 150}"#).unwrap();
        assert_eq!(res.position[0].0, 5.0);
        assert_eq!(res.position[1].0, 6.5);
        assert_eq!(res.direction.0, 150.0);
    }

    #[test]
    fn test_position_accepts_numeric_strings() {
        let res: PositionResponse =
            serde_json::from_str(r#"{"position": ["5.0", "6.5"], "direction": "150"}"#).unwrap();
        assert_eq!(res.position[0].0, 5.0);
        assert_eq!(res.direction.0, 150.0);
    }

    #[test]
    fn test_position_rejects_garbage_strings() {
        let res: Result<PositionResponse, _> =
            serde_json::from_str(r#"{"position": ["x", "6.5"], "direction": "150"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_maze_response_to_layout() {
        let res: MazeResponse = serde_json::from_str(
            r#"{"size": [10, 10], "map": [[[0, 0], [0, 10]], [[2, 9], [3, 9]]]}"#,
        )
        .unwrap();
        let layout = MazeLayout::from(res);
        assert_eq!(layout.size, [10, 10]);
        assert_eq!(layout.walls.len(), 2);
        assert_eq!(layout.walls[1].from, [2.0, 9.0]);
        assert_eq!(layout.walls[1].to, [3.0, 9.0]);
    }
}
