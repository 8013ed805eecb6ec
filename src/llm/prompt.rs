//! Prompt shapes sent to the model, one per content family.

use super::{ChatMessage, ChatRequest, ContentPart, ImageUrl};
use crate::extract::PageImage;
use base64::Engine;

/// Route extraction from a text-bearing PDF (transport permits).
pub fn route_request(model: &str, text: &str) -> ChatRequest {
    let prompt = format!(
        r#"
You are a routing assistant. Read the transport permit text below and extract its route as JSON.

Respond ONLY in this format:
{{
  "origin": "Start address or location",
  "destination": "End address or location",
  "waypoints": ["Stop 1", "Stop 2", ...]
}}

Text:
"""{text}"""
"#
    );
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_text(prompt)],
        temperature: Some(0.0),
        max_tokens: None,
    }
}

/// Summary of plain text (text files, OCR'd images).
pub fn summary_request(model: &str, text: &str) -> ChatRequest {
    let prompt = format!(
        r#"
You are a text analysis assistant. Extract the key information from the text content below.

Respond in this format:
{{
  "type": "document_type",
  "key_information": ["info1", "info2", ...],
  "summary": "brief summary of the text content"
}}

Text content:
"""{text}"""
"#
    );
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_text(prompt)],
        temperature: Some(0.0),
        max_tokens: None,
    }
}

const DOCUMENT_IMAGES_PROMPT: &str = r#"
You are an image analysis assistant. The following images are the pages of a PDF document. Extract the relevant information.

For the document as a whole, provide:
1. Document type and purpose
2. Key information found on the pages
3. Any addresses, locations, or routing information
4. Important dates, names, or numbers

Format your response as JSON:
{
  "document_type": "type of document",
  "key_information": ["info1", "info2", ...],
  "addresses": ["address1", "address2", ...],
  "dates": ["date1", "date2", ...],
  "summary": "brief summary of the document content"
}
"#;

/// Image-bearing PDF: an instruction message followed by every page image in
/// one message, all in a single call.
pub fn document_images_request(model: &str, max_tokens: u32, pages: &[PageImage]) -> ChatRequest {
    let images = pages
        .iter()
        .map(|page| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: png_data_uri(&page.png),
                detail: "high",
            },
        })
        .collect();

    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::user_text(DOCUMENT_IMAGES_PROMPT),
            ChatMessage::user_parts(images),
        ],
        temperature: None,
        max_tokens: Some(max_tokens),
    }
}

pub fn png_data_uri(png: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png);
    format!("data:image/png;base64,{b64}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageContent;

    fn text_of(request: &ChatRequest, idx: usize) -> &str {
        match &request.messages[idx].content {
            MessageContent::Text(text) => text,
            MessageContent::Parts(_) => panic!("expected text message"),
        }
    }

    #[test]
    fn route_prompt_embeds_text_and_schema() {
        let request = route_request("gpt-4o", "From Calais to Dover");
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.messages.len(), 1);
        let prompt = text_of(&request, 0);
        assert!(prompt.contains(r#""""From Calais to Dover""""#));
        assert!(prompt.contains(r#""waypoints""#));
    }

    #[test]
    fn summary_prompt_asks_for_type_and_summary() {
        let request = summary_request("gpt-4o-mini", "Meeting notes");
        let prompt = text_of(&request, 0);
        assert!(prompt.contains(r#""key_information""#));
        assert!(prompt.contains(r#""type": "document_type""#));
        assert!(prompt.contains("Meeting notes"));
    }

    #[test]
    fn vision_request_sends_every_page_in_order() {
        let pages = vec![
            PageImage { number: 1, png: b"one".to_vec() },
            PageImage { number: 2, png: b"two".to_vec() },
        ];
        let request = document_images_request("gpt-4o", 1000, &pages);

        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.temperature, None);
        assert!(text_of(&request, 0).contains(r#""addresses""#));
        match &request.messages[1].content {
            MessageContent::Parts(parts) => {
                let urls: Vec<&str> = parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::ImageUrl { image_url } => image_url.url.as_str(),
                    })
                    .collect();
                assert_eq!(urls, vec!["data:image/png;base64,b25l", "data:image/png;base64,dHdv"]);
            }
            MessageContent::Text(_) => panic!("expected image parts"),
        }
    }
}
