//! Conformance tests for the tokenizer.
//!
//! Each assertion compares the full token stream in its `Type:Value`
//! textual form, joined by `", "` in emission order.

use marlin_html::token_transcript;

/// Shorthand used throughout.
fn read(html: &str) -> String {
    token_transcript(html)
}

// ========== doctype ==========

#[test]
fn doctype_with_identifiers() {
    assert_eq!(
        read(r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#),
        r#"DocType:HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd""#
    );
}

#[test]
fn doctype_html5() {
    assert_eq!(read("<!DOCTYPE html>"), "DocType:html");
}

// ========== text ==========

#[test]
fn plain_text() {
    assert_eq!(read("Hello"), "Text:Hello");
}

#[test]
fn lone_carriage_return_becomes_line_feed() {
    assert_eq!(read("\r"), "Text:\n");
}

#[test]
fn crlf_becomes_two_line_feeds() {
    // The CR is rewritten to LF without consuming the following LF.
    assert_eq!(
        read("<head>\r\n\t<script>somecode</script></head>"),
        "TagStart:head, Text:\n\n\t, TagStart:script, Text:somecode, TagEnd:script, TagEnd:head"
    );
}

// ========== comments ==========

#[test]
fn full_comment() {
    assert_eq!(read("<!--Hello-->"), "Comment:Hello");
}

#[test]
fn single_dash_comment_keeps_dashes() {
    assert_eq!(read("<!-Hello-->"), "Comment:-Hello--");
}

#[test]
fn question_mark_comment_keeps_question_mark() {
    assert_eq!(read("<?import a>"), "Comment:?import a");
}

#[test]
fn question_mark_comment_with_dashes() {
    assert_eq!(read("<?--import a-->"), "Comment:?--import a--");
}

#[test]
fn comment_with_tags_inside() {
    assert_eq!(read("<!-- [opa <i>aa</i>] -->"), "Comment: [opa <i>aa</i>] ");
}

#[test]
fn knockout_style_comments() {
    assert_eq!(
        read(r#"<!-- ko foreach: Peoples --><div data-bind='template:"itemTemplate"'/><!-- /ko -->"#),
        r#"Comment: ko foreach: Peoples , TagStart:div, AttributeName:data-bind, AttributeValue:template:"itemTemplate", TagEnd:div, Comment: /ko "#
    );
}

#[test]
fn comment_between_tags() {
    assert_eq!(
        read("<div><!--Com--></div>"),
        "TagStart:div, Comment:Com, TagEnd:div"
    );
}

// ========== tags ==========

#[test]
fn open_and_close() {
    assert_eq!(read("<a></a>"), "TagStart:a, TagEnd:a");
}

#[test]
fn text_between_tags() {
    assert_eq!(read("<a>Hello</a>"), "TagStart:a, Text:Hello, TagEnd:a");
}

#[test]
fn whitespace_before_close_bracket() {
    assert_eq!(read("<a ></a>"), "TagStart:a, TagEnd:a");
}

#[test]
fn self_closing_emits_synthetic_end_tag() {
    assert_eq!(read("<br/>"), "TagStart:br, TagEnd:br");
    assert_eq!(read("<a />"), "TagStart:a, TagEnd:a");
    assert_eq!(read("<a/><p/>"), "TagStart:a, TagEnd:a, TagStart:p, TagEnd:p");
}

#[test]
fn self_closing_applies_to_any_element_name() {
    // Not restricted to a fixed void-element list.
    assert_eq!(read("<customthing/>"), "TagStart:customthing, TagEnd:customthing");
}

#[test]
fn nested_tags() {
    assert_eq!(
        read("<tr><td></td></tr>"),
        "TagStart:tr, TagStart:td, TagEnd:td, TagEnd:tr"
    );
}

#[test]
fn sibling_headers() {
    assert_eq!(
        read("<h1>Header1</h1><h2>Header2</h2>"),
        "TagStart:h1, Text:Header1, TagEnd:h1, TagStart:h2, Text:Header2, TagEnd:h2"
    );
}

#[test]
fn quotes_in_text_are_plain_characters() {
    assert_eq!(
        read("<p>Hello '<b>World</b>'!</p>"),
        "TagStart:p, Text:Hello ', TagStart:b, Text:World, TagEnd:b, Text:'!, TagEnd:p"
    );
}

#[test]
fn sibling_elements() {
    assert_eq!(
        read("<div></div><span></span>"),
        "TagStart:div, TagEnd:div, TagStart:span, TagEnd:span"
    );
}

#[test]
fn backslash_is_legal_in_tag_names() {
    assert_eq!(read(r"<d\iv></d\iv>"), r"TagStart:d\iv, TagEnd:d\iv");
}

#[test]
fn backslash_does_not_escape_a_tag_open() {
    assert_eq!(read(r"\<span/>"), r"Text:\, TagStart:span, TagEnd:span");
}

#[test]
fn less_than_is_legal_inside_tag_names() {
    assert_eq!(read("<div<div/>"), "TagStart:div<div, TagEnd:div<div");
}

#[test]
fn meta_is_closed_implicitly() {
    assert_eq!(
        read("<meta><meta>"),
        "TagStart:meta, TagEnd:meta, TagStart:meta, TagEnd:meta"
    );
    assert_eq!(
        read("<meta name='viewport'><meta>"),
        "TagStart:meta, AttributeName:name, AttributeValue:viewport, TagEnd:meta, TagStart:meta, TagEnd:meta"
    );
}

#[test]
fn unexpected_end_tag_is_still_emitted() {
    assert_eq!(
        read("<div></div></ul><div></div>"),
        "TagStart:div, TagEnd:div, TagEnd:ul, TagStart:div, TagEnd:div"
    );
}

// ========== script bodies ==========

#[test]
fn comparison_operators_do_not_end_the_script() {
    assert_eq!(
        read("<script>for (var i = 0; i < tokens.length - 1; i++) target = target[tokens[i]];</script>"),
        "TagStart:script, Text:for (var i = 0; i < tokens.length - 1; i++) target = target[tokens[i]];, TagEnd:script"
    );
    assert_eq!(
        read("<script>var a = x > 5;</script>"),
        "TagStart:script, Text:var a = x > 5;, TagEnd:script"
    );
}

#[test]
fn markup_inside_script_is_opaque_text() {
    assert_eq!(
        read("<script><div></div></script>"),
        "TagStart:script, Text:<div></div>, TagEnd:script"
    );
    assert_eq!(
        read("<script><div></div></script><script>alert('a');</script>"),
        "TagStart:script, Text:<div></div>, TagEnd:script, TagStart:script, Text:alert('a');, TagEnd:script"
    );
}

#[test]
fn script_type_does_not_affect_raw_scanning() {
    assert_eq!(
        read("<script type='text/html'><div></div></script>"),
        "TagStart:script, AttributeName:type, AttributeValue:text/html, Text:<div></div>, TagEnd:script"
    );
    assert_eq!(
        read("<script type='text/html'><span /></script>"),
        "TagStart:script, AttributeName:type, AttributeValue:text/html, Text:<span />, TagEnd:script"
    );
}

#[test]
fn end_tag_inside_string_literal_is_skipped() {
    assert_eq!(
        read("<script>console.log(\"\\\"</script>\\\"\");</script>"),
        "TagStart:script, Text:console.log(\"\\\"</script>\\\"\");, TagEnd:script"
    );
}

#[test]
fn dangling_quotes_in_a_regex_are_literal() {
    assert_eq!(
        read(r#"<script>var a = /\/s*["']/g;</script><br/>"#),
        r#"TagStart:script, Text:var a = /\/s*["']/g;, TagEnd:script, TagStart:br, TagEnd:br"#
    );
}

#[test]
fn line_comment_hides_a_quote() {
    assert_eq!(
        read("<script>//\"\r\n</script><br/>"),
        "TagStart:script, Text://\"\r\n, TagEnd:script, TagStart:br, TagEnd:br"
    );
}

#[test]
fn self_closed_script_has_no_body() {
    assert_eq!(read("<script defer/>"), "TagStart:script, AttributeName:defer, TagEnd:script");
}

#[test]
fn markup_inside_closed_string_is_skipped() {
    assert_eq!(
        read(r#"<script>var a = $('<input type="file">')</script>"#),
        r#"TagStart:script, Text:var a = $('<input type="file">'), TagEnd:script"#
    );
    assert_eq!(
        read(r#"<script defer>var a = $('<input type="file">')</script>"#),
        r#"TagStart:script, AttributeName:defer, Text:var a = $('<input type="file">'), TagEnd:script"#
    );
}

#[test]
fn block_comment_hides_an_end_tag() {
    assert_eq!(
        read("<script>/*</script>*/hi();</script>"),
        "TagStart:script, Text:/*</script>*/hi();, TagEnd:script"
    );
}

#[test]
fn escaped_backslash_before_closing_quote() {
    assert_eq!(
        read(r"<script>var a='\\';</script>"),
        r"TagStart:script, Text:var a='\\';, TagEnd:script"
    );
}

#[test]
fn division_is_not_a_comment() {
    assert_eq!(
        read("<script>var bar = 2/1 + '/';</script><body></body>"),
        "TagStart:script, Text:var bar = 2/1 + '/';, TagEnd:script, TagStart:body, TagEnd:body"
    );
    assert_eq!(
        read("<script>var bar = (2)/1 + '/';</script><body></body>"),
        "TagStart:script, Text:var bar = (2)/1 + '/';, TagEnd:script, TagStart:body, TagEnd:body"
    );
}

#[test]
fn entities_are_not_decoded_in_script_bodies() {
    assert_eq!(
        read("<script>&amp;</script>"),
        "TagStart:script, Text:&amp;, TagEnd:script"
    );
}

// ========== other raw-text elements ==========

#[test]
fn textarea_has_no_comment_recognition() {
    assert_eq!(
        read("<textarea><!--</textarea>-->"),
        "TagStart:textarea, Text:<!--, TagEnd:textarea, Text:-->"
    );
}

#[test]
fn raw_text_end_tag_match_is_case_insensitive() {
    // The emitted end tag reuses the start tag's spelling.
    assert_eq!(
        read("<textAREA><!--</TEXTarea>-->"),
        "TagStart:textAREA, Text:<!--, TagEnd:textAREA, Text:-->"
    );
}

#[test]
fn textarea_has_no_string_or_comment_tracking() {
    assert_eq!(
        read("<textarea>/*</textarea>*/"),
        "TagStart:textarea, Text:/*, TagEnd:textarea, Text:*/"
    );
    assert_eq!(
        read("<textarea>\"</textarea>\""),
        "TagStart:textarea, Text:\", TagEnd:textarea, Text:\""
    );
}

#[test]
fn style_body_is_opaque() {
    assert_eq!(
        read("<style>.S{background-image:url(//ssl.gs.com)}</style><div></div>"),
        "TagStart:style, Text:.S{background-image:url(//ssl.gs.com)}, TagEnd:style, TagStart:div, TagEnd:div"
    );
}

// ========== attributes ==========

#[test]
fn simple_element_with_attribute() {
    assert_eq!(
        read("<p id='8'>Text</p>"),
        "TagStart:p, AttributeName:id, AttributeValue:8, Text:Text, TagEnd:p"
    );
}

#[test]
fn solidus_before_attribute_name_is_ignored() {
    assert_eq!(
        read("<span /name='a'></span>"),
        "TagStart:span, AttributeName:name, AttributeValue:a, TagEnd:span"
    );
}

#[test]
fn quoted_values_with_self_closing_tag() {
    assert_eq!(
        read(r#"<a href="http://x.x"/>"#),
        "TagStart:a, AttributeName:href, AttributeValue:http://x.x, TagEnd:a"
    );
    assert_eq!(
        read("<a href='http://x.x'/>"),
        "TagStart:a, AttributeName:href, AttributeValue:http://x.x, TagEnd:a"
    );
}

#[test]
fn other_quote_style_is_literal_inside_a_value() {
    assert_eq!(
        read("<span data-bind = '\"'/>"),
        "TagStart:span, AttributeName:data-bind, AttributeValue:\", TagEnd:span"
    );
}

#[test]
fn double_backslash_does_not_escape_the_delimiter() {
    assert_eq!(
        read(r#"<img src="\\"></img>"#),
        r"TagStart:img, AttributeName:src, AttributeValue:\\, TagEnd:img"
    );
}

#[test]
fn escaped_delimiter_inside_quoted_value() {
    assert_eq!(
        read(r#"<div data-bind="template:\"itemTemplate\""></div>"#),
        r#"TagStart:div, AttributeName:data-bind, AttributeValue:template:"itemTemplate", TagEnd:div"#
    );
}

#[test]
fn boolean_attributes() {
    assert_eq!(
        read("<option value='1' selected>A</option>"),
        "TagStart:option, AttributeName:value, AttributeValue:1, AttributeName:selected, Text:A, TagEnd:option"
    );
    assert_eq!(
        read("<option selected>A</option>"),
        "TagStart:option, AttributeName:selected, Text:A, TagEnd:option"
    );
    assert_eq!(
        read("<option selected id='dd'>A</option>"),
        "TagStart:option, AttributeName:selected, AttributeName:id, AttributeValue:dd, Text:A, TagEnd:option"
    );
}

#[test]
fn attribute_names_may_contain_digits() {
    assert_eq!(read("<div att1></div>"), "TagStart:div, AttributeName:att1, TagEnd:div");
}

#[test]
fn backslash_is_legal_in_attribute_names() {
    assert_eq!(
        read(r"<div na\me='a'></div>"),
        r"TagStart:div, AttributeName:na\me, AttributeValue:a, TagEnd:div"
    );
}

#[test]
fn backslash_does_not_protect_whitespace_in_unquoted_values() {
    assert_eq!(
        read(r"<div name=a\ b></div>"),
        r"TagStart:div, AttributeName:name, AttributeValue:a\, AttributeName:b, TagEnd:div"
    );
}

#[test]
fn backslash_quote_in_unquoted_value_is_a_literal_quote() {
    assert_eq!(
        read(r"<span name=a\'b></span>"),
        "TagStart:span, AttributeName:name, AttributeValue:a'b, TagEnd:span"
    );
}

#[test]
fn backslash_before_other_characters_is_kept() {
    assert_eq!(
        read(r"<span name=a\b></span>"),
        r"TagStart:span, AttributeName:name, AttributeValue:a\b, TagEnd:span"
    );
    assert_eq!(
        read(r"<span name=a\\b></span>"),
        r"TagStart:span, AttributeName:name, AttributeValue:a\\b, TagEnd:span"
    );
}

#[test]
fn less_than_is_legal_inside_attribute_names() {
    assert_eq!(
        read("<span at<tr=1>"),
        "TagStart:span, AttributeName:at<tr, AttributeValue:1"
    );
    assert_eq!(
        read("<span at<tr=''>"),
        "TagStart:span, AttributeName:at<tr, AttributeValue:"
    );
}

#[test]
fn newlines_between_attributes() {
    assert_eq!(
        read("<span attr1='1' \r\n attr2=2>"),
        "TagStart:span, AttributeName:attr1, AttributeValue:1, AttributeName:attr2, AttributeValue:2"
    );
}

#[test]
fn backslash_other_quote_in_quoted_value_is_preserved() {
    assert_eq!(
        read(r#"<a id="\'">"#),
        r"TagStart:a, AttributeName:id, AttributeValue:\'"
    );
}

#[test]
fn unquoted_value_keeps_a_trailing_quote() {
    assert_eq!(
        read("<div at=val'></div>"),
        "TagStart:div, AttributeName:at, AttributeValue:val', TagEnd:div"
    );
}

#[test]
fn unquoted_value_single_character() {
    assert_eq!(
        read("<div class=A>1</div>"),
        "TagStart:div, AttributeName:class, AttributeValue:A, Text:1, TagEnd:div"
    );
}

#[test]
fn duplicate_attribute_names_are_all_emitted() {
    assert_eq!(
        read("<div selected selected selected>"),
        "TagStart:div, AttributeName:selected, AttributeName:selected, AttributeName:selected"
    );
}

// ========== character references ==========

#[test]
fn named_references_decode_in_text() {
    assert_eq!(read("&lang;&rang;&amp;"), "Text:\u{27e8}\u{27e9}&");
    assert_eq!(read("&euro;"), "Text:\u{20ac}");
    assert_eq!(read("<div>&amp;</div>"), "TagStart:div, Text:&, TagEnd:div");
}

#[test]
fn named_references_decode_in_attribute_values() {
    assert_eq!(
        read("<div data='&amp;'></div>"),
        "TagStart:div, AttributeName:data, AttributeValue:&, TagEnd:div"
    );
}

#[test]
fn ampersand_cannot_be_escaped_by_backslash() {
    assert_eq!(read(r"<div>\&amp;</div>"), r"TagStart:div, Text:\&, TagEnd:div");
}

#[test]
fn decoding_is_a_single_pass() {
    assert_eq!(read("&amp;amp;"), "Text:&amp;");
}

#[test]
fn tag_names_are_not_decoded() {
    assert_eq!(read("<s&rang;/>"), "TagStart:s&rang;, TagEnd:s&rang;");
}

#[test]
fn incomplete_and_unknown_references_stay_literal() {
    assert_eq!(read("<span>&ra</span>"), "TagStart:span, Text:&ra, TagEnd:span");
    assert_eq!(
        read("<span>&raduga;</span>"),
        "TagStart:span, Text:&raduga;, TagEnd:span"
    );
    assert_eq!(
        read("<option name='&ra' selected/>"),
        "TagStart:option, AttributeName:name, AttributeValue:&ra, AttributeName:selected, TagEnd:option"
    );
}

// ========== optional end tags (token level) ==========

#[test]
fn unclosed_li_produces_no_extra_tokens() {
    assert_eq!(read("<div><li></div>"), "TagStart:div, TagStart:li, TagEnd:div");
}

#[test]
fn unclosed_option_produces_no_extra_tokens() {
    assert_eq!(
        read("<select><option>1</select>"),
        "TagStart:select, TagStart:option, Text:1, TagEnd:select"
    );
}

// ========== laziness ==========

#[test]
fn tokenizer_is_a_restartable_iterator() {
    let mut first = marlin_html::Tokenizer::new("<a>x</a>");
    let mut second = marlin_html::Tokenizer::new("<a>x</a>");
    assert_eq!(first.next(), second.next());

    let rest_first: Vec<_> = first.collect();
    let rest_second: Vec<_> = second.collect();
    assert_eq!(rest_first, rest_second);
    assert_eq!(rest_first.len(), 3);
}
