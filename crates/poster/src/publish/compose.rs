//! Email content for a generated post.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write;

use crate::generate::{EngagementAnalysis, GeneratedPost};

/// Subject line for a post email.
#[must_use]
pub fn subject(topic: &str) -> String {
    format!("AI-Generated Post: {topic}")
}

/// Plain-text body.
#[must_use]
pub fn text_body(topic: &str, post: &GeneratedPost, analysis: &EngagementAnalysis) -> String {
    let mut text = format!(
        "AI-Generated LinkedIn Post: {topic}\n{rule}\n\n{body}\n\n",
        rule = "=".repeat(60),
        body = post.body,
    );

    text.push_str("ENGAGEMENT ANALYSIS\n");
    text.push_str(&"-".repeat(40));
    text.push('\n');
    let _ = writeln!(text, "Engagement score: {:.1}/100", analysis.engagement_score);

    if !analysis.suggested_improvements.is_empty() {
        text.push_str("\nSuggested improvements:\n");
        for item in &analysis.suggested_improvements {
            let _ = writeln!(text, "• {item}");
        }
    }

    let _ = writeln!(
        text,
        "\nHashtag suggestions: {}",
        analysis.hashtag_suggestions.join(" ")
    );

    if let Some(url) = post.image_url() {
        let _ = writeln!(text, "\nGenerated image: {url}");
    }

    text.push_str("\n---\nYou can copy and paste this content directly to LinkedIn.\n");
    text
}

/// HTML body. Every interpolated value is escaped.
#[must_use]
pub fn html_body(topic: &str, post: &GeneratedPost, analysis: &EngagementAnalysis) -> String {
    let body_html = post
        .body
        .lines()
        .map(html_escape)
        .collect::<Vec<_>>()
        .join("<br>\n");

    let mut engagement_html = format!(
        "<p><strong>Engagement score:</strong> {:.1}/100</p>\n",
        analysis.engagement_score
    );
    if !analysis.suggested_improvements.is_empty() {
        engagement_html.push_str("<p><strong>Suggested improvements:</strong></p>\n<ul>\n");
        for item in &analysis.suggested_improvements {
            let _ = writeln!(engagement_html, "<li>{}</li>", html_escape(item));
        }
        engagement_html.push_str("</ul>\n");
    }
    let _ = writeln!(
        engagement_html,
        "<p><strong>Hashtag suggestions:</strong> {}</p>",
        html_escape(&analysis.hashtag_suggestions.join(" "))
    );

    let image_html = image_html(post);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 800px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #0077B5; color: white; padding: 15px; border-radius: 5px; margin-bottom: 20px; }}
        .post-content {{ background-color: #f9f9f9; border: 1px solid #ddd; border-radius: 5px; padding: 15px; margin-bottom: 20px; }}
        .engagement {{ background-color: #f0f0f0; border: 1px solid #ddd; border-radius: 5px; padding: 15px; margin-bottom: 20px; }}
        .section-title {{ font-weight: bold; margin-top: 20px; margin-bottom: 10px; font-size: 18px; }}
        .note {{ font-style: italic; color: #666; margin-top: 20px; font-size: 0.9em; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header"><h2>AI-Generated LinkedIn Post: {topic}</h2></div>
        <div class="section-title">Post Content</div>
        <div class="post-content">
{body_html}
        </div>
        <div class="section-title">Engagement Analysis</div>
        <div class="engagement">
{engagement_html}        </div>
{image_html}
        <div class="note">You can copy and paste this content directly to LinkedIn. The engagement analysis is for your reference only.</div>
    </div>
</body>
</html>
"#,
        topic = html_escape(topic),
    )
}

/// Embed downloaded bytes as a data URI, otherwise link the hosted image.
fn image_html(post: &GeneratedPost) -> String {
    let src = if let Some((data, mime)) = post.image_bytes() {
        format!("data:{mime};base64,{}", STANDARD.encode(data))
    } else if let Some(url) = post.image_url() {
        html_escape(url)
    } else {
        return String::new();
    };

    format!(
        r#"        <div style="margin: 20px 0;"><img src="{src}" style="max-width: 100%; height: auto;" alt="Generated image for post"></div>"#
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{analyze, PostImage};

    fn post(body: &str, image: Option<PostImage>) -> GeneratedPost {
        GeneratedPost {
            body: body.to_string(),
            image,
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }

    #[test]
    fn test_subject() {
        assert_eq!(subject("Rust"), "AI-Generated Post: Rust");
    }

    #[test]
    fn test_html_body_escapes_content() {
        let p = post("Use <b>Rust</b> & be happy\nSecond line", None);
        let html = html_body("Tools <& tips>", &p, &analyze(&p.body, 5));

        assert!(html.contains("Use &lt;b&gt;Rust&lt;/b&gt; &amp; be happy<br>"));
        assert!(html.contains("Tools &lt;&amp; tips&gt;"));
        assert!(!html.contains("<b>Rust</b>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_image_embedded_when_bytes_available() {
        let image = PostImage {
            url: Some("https://img.example.com/a.png".to_string()),
            data: Some(vec![0x89, b'P', b'N', b'G']),
            mime: "image/png",
        };
        let p = post("Body", Some(image));
        let html = html_body("Topic", &p, &analyze(&p.body, 5));
        assert!(html.contains(r#"src="data:image/png;base64,iVBORw==""#));
    }

    #[test]
    fn test_image_linked_without_bytes() {
        let image = PostImage {
            url: Some("https://img.example.com/a.png?x=1&y=2".to_string()),
            data: None,
            mime: "image/png",
        };
        let p = post("Body", Some(image));
        let html = html_body("Topic", &p, &analyze(&p.body, 5));
        assert!(html.contains(r#"src="https://img.example.com/a.png?x=1&amp;y=2""#));

        let text = text_body("Topic", &p, &analyze(&p.body, 5));
        assert!(text.contains("Generated image: https://img.example.com/a.png?x=1&y=2"));
    }

    #[test]
    fn test_text_body_contains_post_and_analysis() {
        let p = post("Latest trends in AI engineering are here.", None);
        let text = text_body("AI", &p, &analyze(&p.body, 5));
        assert!(text.contains("Latest trends in AI engineering are here."));
        assert!(text.contains("Consider adding relevant hashtags"));
        assert!(text.contains("#linkedin #professional #business"));
    }
}
