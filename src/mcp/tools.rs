//! MCP tool definitions
//!
//! Declares the Jira/Confluence tools exposed to the agent, with their
//! JSON input schemas.

use serde_json::json;

use super::protocol::Tool;

/// Get all available MCP tools
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "get_issue_content_jira".into(),
            description: "Get a Jira issue by id or key (e.g. \"PROJ-123\"): \
                          metadata, status, description, attachments, comments."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "issue_id_or_key": {
                        "type": "string",
                        "description": "Issue id or key, e.g. \"PROJ-123\""
                    }
                },
                "required": ["issue_id_or_key"]
            }),
        },
        Tool {
            name: "create_issue_jira".into(),
            description: "Create a Jira issue in a project.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_key": {
                        "type": "string",
                        "description": "Project key, e.g. \"PROJ\""
                    },
                    "summary": {
                        "type": "string",
                        "description": "Short issue title"
                    },
                    "description": {
                        "type": "string",
                        "description": "Detailed issue description"
                    },
                    "issue_type": {
                        "type": "string",
                        "default": "Task",
                        "description": "Issue type name, e.g. \"Task\" or \"Bug\""
                    }
                },
                "required": ["project_key", "summary", "description"]
            }),
        },
        Tool {
            name: "describe_image_jira".into(),
            description: "Describe an image attached to a Jira issue using the AI \
                          model. Takes the attachment's direct download URL and a \
                          prompt to guide the description."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Direct download URL of the image attachment"
                    },
                    "mime_type": {
                        "type": "string",
                        "description": "Image MIME type, e.g. \"image/png\""
                    },
                    "prompt": {
                        "type": "string",
                        "description": "Prompt guiding the description"
                    }
                },
                "required": ["url", "mime_type", "prompt"]
            }),
        },
        Tool {
            name: "get_page_id_confluence".into(),
            description: "Look up a Confluence page id by space key and title.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_key": {
                        "type": "string",
                        "description": "Space key, e.g. \"ENG\""
                    },
                    "title": {
                        "type": "string",
                        "description": "Page title as shown in the UI"
                    }
                },
                "required": ["space_key", "title"]
            }),
        },
        Tool {
            name: "get_page_content_confluence".into(),
            description: "Get a Confluence page with its storage-format body. \
                          Embedded diagram macros are resolved to their attachment \
                          content and inlined as literal code blocks; all other \
                          markup is preserved unchanged."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "Page id, e.g. \"123456\""
                    }
                },
                "required": ["page_id"]
            }),
        },
        Tool {
            name: "create_page_confluence".into(),
            description: "Create a Confluence page, optionally under a parent page.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "space_key": {
                        "type": "string",
                        "description": "Space key, e.g. \"ENG\""
                    },
                    "title": {
                        "type": "string",
                        "description": "Title of the new page"
                    },
                    "body": {
                        "type": "string",
                        "description": "Page body in storage format"
                    },
                    "parent_id": {
                        "type": "string",
                        "description": "Optional parent page id"
                    }
                },
                "required": ["space_key", "title", "body"]
            }),
        },
        Tool {
            name: "get_attachments_confluence".into(),
            description: "List the attachments of a Confluence page (metadata only).".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "Page id, e.g. \"123456\""
                    }
                },
                "required": ["page_id"]
            }),
        },
        Tool {
            name: "describe_image_confluence".into(),
            description: "Describe an image attached to a Confluence page using the \
                          AI model."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "Page id containing the attachment"
                    },
                    "filename": {
                        "type": "string",
                        "description": "Attachment filename, e.g. \"diagram.png\""
                    },
                    "mime_type": {
                        "type": "string",
                        "description": "Image MIME type, e.g. \"image/png\""
                    },
                    "prompt": {
                        "type": "string",
                        "description": "Prompt guiding the description"
                    }
                },
                "required": ["page_id", "filename", "mime_type", "prompt"]
            }),
        },
        Tool {
            name: "get_descendant_pages_confluence".into(),
            description: "Get the complete descendant page tree of a Confluence page \
                          as nested {id, title, children} nodes. Follows the child \
                          listing through all of its pages, so large trees are never \
                          truncated."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page_id": {
                        "type": "string",
                        "description": "Root page id"
                    },
                    "title": {
                        "type": "string",
                        "default": "",
                        "description": "Optional title of the root page"
                    }
                },
                "required": ["page_id"]
            }),
        },
    ]
}
