//! # Article schema
//!
//! The node and mark vocabulary of the blog editor. Registration order
//! matters: parse rules are tried in this order, so the more specific
//! `ul[data-type=taskList]` and `li[data-type=taskItem]` come before the
//! plain list rules, and the social card before `blockquote`.

use crate::attrs::{attrs, AttrSpec, AttrValue, Attrs};
use crate::context::RenderContext;
use crate::dom_spec::DomSpec;
use crate::embed::{canonical_social_url, SocialPost, VideoEmbed, VIDEO_HEIGHT, VIDEO_WIDTH};
use crate::error::Result;
use crate::node_type::{MarkAllowance, MarkType, NodeCategory, NodeType};
use crate::parse_rule::{ParseContent, ParseRule, Selector};
use crate::registry::Schema;
use crate::sanitize::{is_safe_color, is_safe_href};
use ecnn_markup::Element;

pub const TEXT_ALIGNMENTS: [&str; 4] = ["left", "center", "right", "justify"];

/// Build the article schema
pub fn article_schema() -> Result<Schema> {
    let mut schema = Schema::new();

    schema.register_node(NodeType::new("text", NodeCategory::Inline).group("inline"))?;
    schema.register_node(
        NodeType::new("hard_break", NodeCategory::Inline)
            .group("inline")
            .parse(ParseRule::tag("br"))
            .render(|_, _| DomSpec::element("br")),
    )?;
    schema.register_node(
        NodeType::new("paragraph", NodeCategory::Block)
            .group("block")
            .content("inline*")
            .attr("text_align", align_spec())
            .splittable()
            .parse(ParseRule::tag("p").get_attrs(parse_align))
            .render(|attrs, _| with_align(DomSpec::element("p"), attrs).hole()),
    )?;

    let mut heading = NodeType::new("heading", NodeCategory::Block)
        .group("block")
        .content("inline*")
        .attr("level", AttrSpec::int(1).one_of(1i64..=6))
        .attr("text_align", align_spec())
        .splittable()
        .render(render_heading);
    for level in 1..=6 {
        heading = heading.parse(ParseRule::tag(&format!("h{}", level)).get_attrs(parse_heading));
    }
    schema.register_node(heading)?;

    schema.register_node(
        NodeType::new("code_block", NodeCategory::Block)
            .group("block")
            .content("text*")
            .attr("language", AttrSpec::optional_string())
            .marks(MarkAllowance::None)
            .code()
            .splittable()
            .parse(
                ParseRule::tag("pre")
                    .get_attrs(parse_code_language)
                    .content(ParseContent::Preformatted),
            )
            .render(render_code_block),
    )?;
    schema.register_node(
        NodeType::new("horizontal_rule", NodeCategory::Atomic)
            .group("block")
            .parse(ParseRule::tag("hr"))
            .render(|_, _| DomSpec::element("hr")),
    )?;
    schema.register_node(
        NodeType::new("image", NodeCategory::Atomic)
            .group("block")
            .attr("src", AttrSpec::required_string())
            .attr("alt", AttrSpec::optional_string())
            .attr("title", AttrSpec::optional_string())
            .parse(ParseRule::new(Selector::tag("img").has_attr("src")).get_attrs(parse_image))
            .render(render_image),
    )?;
    schema.register_node(
        NodeType::new("video_embed", NodeCategory::Atomic)
            .group("block")
            .attr("src", AttrSpec::required_string())
            .attr("width", AttrSpec::string(VIDEO_WIDTH))
            .attr("height", AttrSpec::string(VIDEO_HEIGHT))
            .attr("allowfullscreen", AttrSpec::bool(true))
            .parse(
                ParseRule::new(Selector::tag("div").attr_eq("data-embed", "video"))
                    .get_attrs(parse_video_wrapper)
                    .content(ParseContent::Ignore),
            )
            .parse(
                ParseRule::new(Selector::tag("iframe").attr_contains("src", "youtube.com/embed/"))
                    .get_attrs(parse_video_iframe)
                    .content(ParseContent::Ignore),
            )
            .render(render_video),
    )?;
    schema.register_node(
        NodeType::new("social_embed", NodeCategory::Atomic)
            .group("block")
            .attr("url", AttrSpec::required_string())
            .parse(
                ParseRule::new(Selector::tag("div").attr_eq("data-embed", "social"))
                    .get_attrs(parse_social_wrapper)
                    .content(ParseContent::Ignore),
            )
            .parse(
                ParseRule::new(Selector::tag("blockquote").class("twitter-tweet"))
                    .get_attrs(parse_social_quote)
                    .content(ParseContent::Ignore),
            )
            .render(render_social),
    )?;
    schema.register_node(
        NodeType::new("task_item", NodeCategory::Block)
            .content("block+")
            .attr("checked", AttrSpec::bool(false))
            .splittable()
            .parse(
                ParseRule::new(Selector::tag("li").attr_eq("data-type", "taskItem"))
                    .get_attrs(|el| Some(attrs([("checked", el.attr("data-checked") == Some("true"))]))),
            )
            .render(render_task_item),
    )?;
    schema.register_node(
        NodeType::new("list_item", NodeCategory::Block)
            .content("block+")
            .splittable()
            .parse(ParseRule::tag("li"))
            .render(|_, _| DomSpec::element("li").hole()),
    )?;
    schema.register_node(
        NodeType::new("task_list", NodeCategory::Block)
            .group("block")
            .group("list")
            .content("task_item+")
            .parse(ParseRule::new(Selector::tag("ul").attr_eq("data-type", "taskList")))
            .render(|_, _| DomSpec::element("ul").attr("data-type", "taskList").hole()),
    )?;
    schema.register_node(
        NodeType::new("bullet_list", NodeCategory::Block)
            .group("block")
            .group("list")
            .content("list_item+")
            .parse(ParseRule::tag("ul"))
            .render(|_, _| DomSpec::element("ul").hole()),
    )?;
    schema.register_node(
        NodeType::new("ordered_list", NodeCategory::Block)
            .group("block")
            .group("list")
            .content("list_item+")
            .attr("start", AttrSpec::int(1))
            .parse(ParseRule::tag("ol").get_attrs(|el| {
                let start = el
                    .attr("start")
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .unwrap_or(1);
                Some(attrs([("start", start)]))
            }))
            .render(|attrs, _| {
                let start = attrs.get("start").and_then(AttrValue::as_int).unwrap_or(1);
                let list = DomSpec::element("ol");
                let list = if start != 1 {
                    list.attr("start", start.to_string())
                } else {
                    list
                };
                list.hole()
            }),
    )?;
    schema.register_node(
        NodeType::new("blockquote", NodeCategory::Block)
            .group("block")
            .content("block+")
            .parse(ParseRule::tag("blockquote"))
            .render(|_, _| DomSpec::element("blockquote").hole()),
    )?;
    schema.register_node(
        NodeType::new("table_header", NodeCategory::Block)
            .content("block+")
            .attr("colspan", AttrSpec::int(1))
            .attr("rowspan", AttrSpec::int(1))
            .parse(ParseRule::tag("th").get_attrs(parse_cell_spans))
            .render(|attrs, _| render_cell("th", attrs)),
    )?;
    schema.register_node(
        NodeType::new("table_cell", NodeCategory::Block)
            .content("block+")
            .attr("colspan", AttrSpec::int(1))
            .attr("rowspan", AttrSpec::int(1))
            .parse(ParseRule::tag("td").get_attrs(parse_cell_spans))
            .render(|attrs, _| render_cell("td", attrs)),
    )?;
    schema.register_node(
        NodeType::new("table_row", NodeCategory::Block)
            .content("(table_cell | table_header)+")
            .parse(ParseRule::tag("tr"))
            .render(|_, _| DomSpec::element("tr").attr("class", "custom-table-row").hole()),
    )?;
    schema.register_node(
        NodeType::new("table", NodeCategory::Block)
            .group("block")
            .content("table_row+")
            .parse(ParseRule::tag("table"))
            .render(|_, _| {
                DomSpec::element("table")
                    .attr("class", "custom-table")
                    .child(DomSpec::element("tbody").hole())
            }),
    )?;
    schema.register_node(NodeType::new("doc", NodeCategory::Block).content("block+"))?;

    register_marks(&mut schema)?;
    schema.check_complete()?;
    Ok(schema)
}

fn register_marks(schema: &mut Schema) -> Result<()> {
    schema.register_mark(
        MarkType::new("link")
            .attr("href", AttrSpec::required_string())
            .attr("target", AttrSpec::optional_string())
            .exclusive_end()
            .parse(ParseRule::new(Selector::tag("a").has_attr("href")).get_attrs(parse_link))
            .render(|attrs, _| {
                DomSpec::element("a")
                    .attr_opt("href", attrs.get("href").and_then(AttrValue::to_markup))
                    .attr_opt("target", attrs.get("target").and_then(AttrValue::to_markup))
                    .attr("rel", "noopener noreferrer nofollow")
                    .hole()
            }),
    )?;
    schema.register_mark(
        MarkType::new("bold")
            .parse(ParseRule::tag("strong"))
            .parse(ParseRule::tag("b"))
            .render(|_, _| DomSpec::element("strong").hole()),
    )?;
    schema.register_mark(
        MarkType::new("italic")
            .parse(ParseRule::tag("em"))
            .parse(ParseRule::tag("i"))
            .render(|_, _| DomSpec::element("em").hole()),
    )?;
    schema.register_mark(
        MarkType::new("underline")
            .parse(ParseRule::tag("u"))
            .render(|_, _| DomSpec::element("u").hole()),
    )?;
    schema.register_mark(
        MarkType::new("strike")
            .parse(ParseRule::tag("s"))
            .parse(ParseRule::tag("del"))
            .parse(ParseRule::tag("strike"))
            .render(|_, _| DomSpec::element("s").hole()),
    )?;
    schema.register_mark(
        MarkType::new("code")
            .parse(ParseRule::tag("code"))
            .render(|_, _| DomSpec::element("code").hole()),
    )?;
    schema.register_mark(
        MarkType::new("highlight")
            .attr("color", AttrSpec::optional_string())
            .parse(ParseRule::tag("mark").get_attrs(|el| {
                let color = el
                    .attr("data-color")
                    .map(str::to_string)
                    .or_else(|| el.style("background-color"))
                    .filter(|c| is_safe_color(c));
                Some(attrs([("color", AttrValue::from(color))]))
            }))
            .render(|attrs, _| {
                let color = attrs.get("color").and_then(AttrValue::to_markup);
                let style = color.as_ref().map(|c| format!("background-color: {}", c));
                DomSpec::element("mark")
                    .attr_opt("data-color", color)
                    .attr_opt("style", style)
                    .hole()
            }),
    )?;
    schema.register_mark(
        MarkType::new("text_style")
            .attr("color", AttrSpec::required_string())
            .parse(
                ParseRule::new(Selector::tag("span").has_attr("style"))
                    .get_attrs(|el| {
                        let color = el.style("color").filter(|c| is_safe_color(c))?;
                        Some(attrs([("color", color)]))
                    }),
            )
            .render(|attrs, _| {
                let style = attrs
                    .get("color")
                    .and_then(AttrValue::to_markup)
                    .map(|c| format!("color: {}", c));
                DomSpec::element("span").attr_opt("style", style).hole()
            }),
    )?;
    Ok(())
}

fn parse_link(el: &Element) -> Option<Attrs> {
    let href = el.attr("href")?.trim();
    if !is_safe_href(href) {
        return None;
    }
    Some(attrs([
        ("href", AttrValue::from(href)),
        ("target", AttrValue::from(el.attr("target"))),
    ]))
}

fn align_spec() -> AttrSpec {
    AttrSpec::string("left").one_of(TEXT_ALIGNMENTS)
}

fn parse_align(el: &Element) -> Option<Attrs> {
    let align = el
        .style("text-align")
        .map(|a| a.to_ascii_lowercase())
        .filter(|a| TEXT_ALIGNMENTS.contains(&a.as_str()))
        .unwrap_or_else(|| "left".to_string());
    Some(attrs([("text_align", align)]))
}

fn with_align(spec: DomSpec, attrs: &Attrs) -> DomSpec {
    match attrs.get("text_align").and_then(AttrValue::as_str) {
        Some(align) if align != "left" => spec.attr("style", format!("text-align: {}", align)),
        _ => spec,
    }
}

fn parse_heading(el: &Element) -> Option<Attrs> {
    let level = el.tag.strip_prefix('h')?.parse::<i64>().ok()?;
    let mut found = parse_align(el)?;
    found.insert("level".to_string(), AttrValue::Int(level));
    Some(found)
}

fn render_heading(attrs: &Attrs, _: &RenderContext) -> DomSpec {
    let level = attrs
        .get("level")
        .and_then(AttrValue::as_int)
        .unwrap_or(1)
        .clamp(1, 6);
    with_align(DomSpec::element(format!("h{}", level)), attrs).hole()
}

fn parse_code_language(el: &Element) -> Option<Attrs> {
    let language = el.find("code").and_then(|code| {
        code.classes()
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string)
    });
    Some(attrs([("language", AttrValue::from(language))]))
}

fn render_code_block(attrs: &Attrs, _: &RenderContext) -> DomSpec {
    let class = attrs
        .get("language")
        .and_then(AttrValue::as_str)
        .map(|language| format!("language-{}", language));
    DomSpec::element("pre").child(DomSpec::element("code").attr_opt("class", class).hole())
}

fn parse_image(el: &Element) -> Option<Attrs> {
    let src = el.attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    Some(attrs([
        ("src", AttrValue::from(src)),
        ("alt", AttrValue::from(el.attr("alt"))),
        ("title", AttrValue::from(el.attr("title"))),
    ]))
}

fn render_image(attrs: &Attrs, _: &RenderContext) -> DomSpec {
    DomSpec::element("img")
        .attr_opt("src", attrs.get("src").and_then(AttrValue::to_markup))
        .attr_opt("alt", attrs.get("alt").and_then(AttrValue::to_markup))
        .attr_opt("title", attrs.get("title").and_then(AttrValue::to_markup))
}

fn parse_video_iframe(el: &Element) -> Option<Attrs> {
    let video = VideoEmbed::from_embed_src(el.attr("src")?)?;
    let width = el.attr("width").unwrap_or(VIDEO_WIDTH);
    let height = el.attr("height").unwrap_or(VIDEO_HEIGHT);
    Some(attrs([
        ("src", AttrValue::from(video.embed_src())),
        ("width", AttrValue::from(width)),
        ("height", AttrValue::from(height)),
        ("allowfullscreen", AttrValue::from(el.has_attr("allowfullscreen"))),
    ]))
}

fn parse_video_wrapper(el: &Element) -> Option<Attrs> {
    parse_video_iframe(el.find("iframe")?)
}

fn render_video(attrs: &Attrs, _: &RenderContext) -> DomSpec {
    let src = attrs.get("src").and_then(AttrValue::to_markup);
    let watch = src
        .as_deref()
        .and_then(VideoEmbed::from_embed_src)
        .map(|video| video.watch_url());
    let mut iframe = DomSpec::element("iframe")
        .attr_opt("src", src)
        .attr_opt("width", attrs.get("width").and_then(AttrValue::to_markup))
        .attr_opt("height", attrs.get("height").and_then(AttrValue::to_markup))
        .attr("frameborder", "0")
        .attr(
            "allow",
            "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share",
        )
        .attr("title", "YouTube video player");
    if attrs.get("allowfullscreen").and_then(AttrValue::as_bool) == Some(true) {
        iframe = iframe.attr("allowfullscreen", "true");
    }
    if let Some(watch) = watch {
        iframe = iframe.child(
            DomSpec::element("a")
                .attr("href", watch.clone())
                .child(DomSpec::text(watch)),
        );
    }
    DomSpec::element("div")
        .attr("class", "yt-embed-wrapper")
        .attr("data-embed", "video")
        .child(iframe)
}

fn parse_social_wrapper(el: &Element) -> Option<Attrs> {
    let url = el.attr("data-url").map(str::to_string).or_else(|| {
        el.find("a")
            .and_then(|a| a.attr("href"))
            .map(str::to_string)
    })?;
    let post = SocialPost::parse(&url)?;
    Some(attrs([("url", post.url)]))
}

fn parse_social_quote(el: &Element) -> Option<Attrs> {
    let href = el.find("a")?.attr("href")?;
    let post = SocialPost::parse(href)?;
    Some(attrs([("url", post.url)]))
}

fn render_social(attrs: &Attrs, ctx: &RenderContext) -> DomSpec {
    let url = attrs
        .get("url")
        .and_then(AttrValue::to_markup)
        .unwrap_or_default();
    let caption = canonical_social_url(&url);
    let mut quote = DomSpec::element("blockquote")
        .attr("class", "twitter-tweet")
        .attr("data-lang", "en");
    if ctx.is_dark() {
        quote = quote.attr("data-theme", "dark");
    }
    quote = quote.child(
        DomSpec::element("a")
            .attr("href", caption.clone())
            .child(DomSpec::text(caption)),
    );
    DomSpec::element("div")
        .attr("class", "twitter-embed-wrapper")
        .attr("data-embed", "social")
        .attr("data-url", url)
        .child(quote)
}

fn render_task_item(attrs: &Attrs, _: &RenderContext) -> DomSpec {
    let checked = attrs.get("checked").and_then(AttrValue::as_bool) == Some(true);
    let mut checkbox = DomSpec::element("input").attr("type", "checkbox");
    if checked {
        checkbox = checkbox.attr("checked", "checked");
    }
    DomSpec::element("li")
        .attr("data-type", "taskItem")
        .attr("data-checked", checked.to_string())
        .child(DomSpec::element("label").child(checkbox))
        .child(DomSpec::element("div").hole())
}

fn parse_cell_spans(el: &Element) -> Option<Attrs> {
    let span = |name: &str| {
        el.attr(name)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(1)
    };
    Some(attrs([("colspan", span("colspan")), ("rowspan", span("rowspan"))]))
}

fn render_cell(tag: &str, attrs: &Attrs) -> DomSpec {
    let mut cell = DomSpec::element(tag).attr("class", "custom-table-cell");
    for name in ["colspan", "rowspan"] {
        match attrs.get(name).and_then(AttrValue::as_int) {
            Some(span) if span != 1 => cell = cell.attr(name, span.to_string()),
            _ => {}
        }
    }
    cell.hole()
}
