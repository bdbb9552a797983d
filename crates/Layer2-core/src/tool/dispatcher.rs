//! Tool Dispatcher - 이름 -> 도구, 시작 시 한 번 구성
//!
//! 도구 목록은 닫혀 있습니다. 명시적으로 전달받으며 이후 추가/제거되지 않습니다.
//! 모든 호출은 `ToolResult`로 끝나고, 알 수 없는 이름과 도구 오류는 에러 텍스트가 됩니다.

use dock_foundation::{Error, Result, Tool, ToolContext, ToolResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// 호스트에 알리는 도구 정보
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub struct ToolDispatcher {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    context: Arc<dyn ToolContext>,
}

impl ToolDispatcher {
    /// 도구 이름이 중복되면 실패
    pub fn new(tools: Vec<Arc<dyn Tool>>, context: Arc<dyn ToolContext>) -> Result<Self> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(Error::Config(format!(
                    "Duplicate tool name: {}",
                    tool.name()
                )));
            }
        }
        Ok(Self {
            tools,
            index,
            context,
        })
    }

    /// 등록 순서대로의 descriptor 목록
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.meta().description,
                input_schema: tool.schema(),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn invoke(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return ToolResult::error(format!("Error: Unknown tool '{}'.", name));
        };

        let started = Instant::now();
        let result = match tool.execute(args, self.context.as_ref()).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_user_facing() {
                    debug!("Tool {} refused input: {}", name, e);
                } else {
                    warn!("Tool {} failed: {}", name, e);
                }
                ToolResult::error(format!("Error: {}", e))
            }
        };
        debug!(
            "Tool {} finished in {:?} (error: {})",
            name,
            started.elapsed(),
            result.is_error
        );
        result
    }
}
