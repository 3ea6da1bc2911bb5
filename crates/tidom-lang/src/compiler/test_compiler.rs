//! Scenario tests for the compiler, checked against the exact function body.

use rstest::rstest;
use smol_str::SmolStr;

use super::{Compiled, Compiler};
use crate::error::{CompileError, InnerError};
use crate::options::Options;
use crate::package::OutputMode;

fn compile(source: &str) -> Compiled {
    Compiler::default().compile(source).unwrap()
}

fn body(source: &str) -> Vec<String> {
    compile(source).program.body
}

#[test]
fn test_if_attribute_wraps_element() {
    assert_eq!(
        body("<div if=\"x > 0\"><span>{x}</span></div>"),
        vec![
            "if (x > 0) {",
            "  elementOpen(\"div\")",
            "    elementOpen(\"span\")",
            "      text(\"\" + (x))",
            "    elementClose(\"span\")",
            "  elementClose(\"div\")",
            "}",
        ]
    );
}

#[test]
fn test_each_tag() {
    assert_eq!(
        body("<each expression=\"item in items\"><li>{item}</li></each>"),
        vec![
            "var __target1 = items",
            "if (__target1 != null) {",
            "  ;(__target1.forEach ? __target1 : Object.keys(__target1)).forEach(function ($value, $item) {",
            "    if (!__target1.forEach) { $item = $value; $value = __target1[$item] }",
            "    var item = $value",
            "    var $key1 = $item + \"_k1\"",
            "    elementOpen(\"li\", $key1 + \"_1\")",
            "      text(\"\" + (item))",
            "    elementClose(\"li\")",
            "  }, this)",
            "}",
        ]
    );
}

#[test]
fn test_text_interpolation() {
    assert_eq!(
        body("<p>Hello {name}!</p>"),
        vec![
            "elementOpen(\"p\")",
            "  text(\"Hello \" + (name) + \"!\")",
            "elementClose(\"p\")",
        ]
    );
}

#[test]
fn test_if_elseif_else_chain() {
    assert_eq!(
        body(
            "<if condition=\"a\"><p>A</p><elseif condition=\"b\"><p>B</p></elseif><else><p>C</p></else></if>"
        ),
        vec![
            "if (a) {",
            "  elementOpen(\"p\")",
            "    text(\"A\")",
            "  elementClose(\"p\")",
            "} else if (b) {",
            "  elementOpen(\"p\")",
            "    text(\"B\")",
            "  elementClose(\"p\")",
            "} else {",
            "  elementOpen(\"p\")",
            "    text(\"C\")",
            "  elementClose(\"p\")",
            "}",
        ]
    );
}

#[test]
fn test_self_closing_branches() {
    assert_eq!(
        body("<if expression=\"a\">A<elseif expression=\"b\"/>B<else/>C</if>"),
        vec![
            "if (a) {",
            "  text(\"A\")",
            "} else if (b) {",
            "  text(\"B\")",
            "} else {",
            "  text(\"C\")",
            "}",
        ]
    );
}

#[test]
fn test_unclosed_branch_is_closed_by_if() {
    let compiled = compile("<if condition=\"a\">A<else>B</if>");

    assert_eq!(
        compiled.program.body,
        vec!["if (a) {", "  text(\"A\")", "} else {", "  text(\"B\")", "}"]
    );
    assert!(compiled.diagnostics.is_empty());
}

#[test]
fn test_second_else_degrades_to_if() {
    let compiled = compile("<if condition=\"a\"><else></else><else></else></if>");

    assert_eq!(
        compiled.program.body,
        vec!["if (a) {", "} else {", "  if (true) {", "  }", "}"]
    );
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::UnmatchedDirective { directive, reason, .. }]
            if directive == "else" && reason.contains("already has an `<else>`")
    ));
}

#[test]
fn test_orphan_elseif_degrades_to_if() {
    let compiled = compile("<elseif condition=\"b\"><p>x</p></elseif>");

    assert_eq!(
        compiled.program.body,
        vec![
            "if (b) {",
            "  elementOpen(\"p\")",
            "    text(\"x\")",
            "  elementClose(\"p\")",
            "}",
        ]
    );
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::UnmatchedDirective { directive, .. }] if directive == "elseif"
    ));
}

#[test]
fn test_if_each_and_skip_on_one_element() {
    assert_eq!(
        body("<li if=\"show\" each=\"item in items\" skip=\"item.locked\">{item.name}</li>"),
        vec![
            "if (show) {",
            "  var __target1 = items",
            "  if (__target1 != null) {",
            "    ;(__target1.forEach ? __target1 : Object.keys(__target1)).forEach(function ($value, $item) {",
            "      if (!__target1.forEach) { $item = $value; $value = __target1[$item] }",
            "      var item = $value",
            "      var $key1 = $item + \"_k1\"",
            "      elementOpen(\"li\", $key1)",
            "        if (item.locked) {",
            "          skip()",
            "        } else {",
            "          text(\"\" + (item.name))",
            "        }",
            "      elementClose(\"li\")",
            "    }, this)",
            "  }",
            "}",
        ]
    );
}

#[test]
fn test_nested_loops_compose_keys() {
    let body = body(
        "<each expression=\"row, r in rows\"><each expression=\"cell, c in row.cells\"><td>{cell}</td></each></each>",
    );

    assert!(body.contains(&"    var r = $item".to_string()));
    assert!(body.contains(&"    var $key1 = (r) + \"_k1\"".to_string()));
    assert!(body.contains(&"        var c = $item".to_string()));
    assert!(body.contains(&"        var $key2 = $key1 + \"_\" + (c) + \"_k2\"".to_string()));
    assert!(body.contains(&"        elementOpen(\"td\", $key2 + \"_1\")".to_string()));
}

#[test]
fn test_inline_each_inside_each_tag_composes_keys() {
    let body = body(
        "<each expression=\"group in groups\"><ul><li each=\"item, item.id in group.items\"></li></ul></each>",
    );

    assert!(body.contains(&"    elementOpen(\"ul\", $key1 + \"_1\")".to_string()));
    assert!(
        body.contains(&"          var $key2 = $key1 + \"_\" + (item.id) + \"_k2\"".to_string())
    );
    assert!(body.contains(&"          elementOpen(\"li\", $key2)".to_string()));
}

#[test]
fn test_ordinal_keys_for_direct_children() {
    let body = body(
        "<each expression=\"x in xs\"><h2><b>{x.title}</b></h2><if condition=\"x.body\"><p>{x.body}</p></if><span key=\"fixed\"></span><em></em></each>",
    )
    .into_iter()
    .filter(|line| line.trim_start().starts_with("elementOpen"))
    .map(|line| line.trim().to_string())
    .collect::<Vec<_>>();

    assert_eq!(
        body,
        vec![
            "elementOpen(\"h2\", $key1 + \"_1\")",
            "elementOpen(\"b\")",
            "elementOpen(\"p\", $key1 + \"_2\")",
            "elementOpen(\"span\", \"fixed\")",
            "elementOpen(\"em\", $key1 + \"_3\")",
        ]
    );
}

#[test]
fn test_each_over_object_binds_values_and_keys() {
    let body = body("<each expression=\"value, name in settings\"><dt>{name}</dt></each>");

    assert_eq!(body[3], "    if (!__target1.forEach) { $item = $value; $value = __target1[$item] }");
    assert_eq!(body[4], "    var value = $value");
    assert_eq!(body[5], "    var name = $item");
    assert_eq!(body[6], "    var $key1 = (name) + \"_k1\"");
}

#[test]
fn test_statics_are_hoisted_and_deduplicated() {
    let compiled = compile(
        "<div class=\"a\" id=\"x\"></div><div id=\"x\" class=\"a\"></div><div class=\"b\"></div>",
    );

    assert_eq!(
        compiled.program.body,
        vec![
            "elementOpen(\"div\", \"k1\", hoisted1)",
            "elementClose(\"div\")",
            "elementOpen(\"div\", \"k2\", hoisted1)",
            "elementClose(\"div\")",
            "elementOpen(\"div\", \"k3\", hoisted2)",
            "elementClose(\"div\")",
        ]
    );
    assert_eq!(
        compiled.program.prologue,
        "var hoisted1 = [\"class\", \"a\", \"id\", \"x\"]\nvar hoisted2 = [\"class\", \"b\"]"
    );
}

#[rstest]
#[case::empty_key("<input key=\"\" type=\"text\" value=\"{v}\">", false)]
#[case::option("<input type=\"text\" value=\"{v}\">", true)]
fn test_no_statics(#[case] source: &str, #[case] no_statics: bool) {
    let compiled = Compiler::new(Options {
        no_statics,
        ..Options::default()
    })
    .compile(source)
    .unwrap();

    assert_eq!(
        compiled.program.body,
        vec![
            "elementOpen(\"input\", null, null, \"type\", \"text\", \"value\", v)",
            "elementClose(\"input\")",
        ]
    );
    assert!(compiled.program.prologue.is_empty());
}

#[test]
fn test_event_handler() {
    assert_eq!(
        body("<button onclick=\"{save(item)}\">Save</button>"),
        vec![
            "elementOpen(\"button\", null, null, \"onclick\", function ($event) {",
            "  var $element = this;",
            "  save(item)",
            "})",
            "  text(\"Save\")",
            "elementClose(\"button\")",
        ]
    );
}

#[test]
fn test_whitespace_text_is_dropped() {
    assert_eq!(
        body("<ul>\n  <li>a</li>\n</ul>\n"),
        vec![
            "elementOpen(\"ul\")",
            "  elementOpen(\"li\")",
            "    text(\"a\")",
            "  elementClose(\"li\")",
            "elementClose(\"ul\")",
        ]
    );
}

#[test]
fn test_multiline_text_uses_continuations() {
    assert_eq!(
        body("<p>one\r\ntwo</p>"),
        vec![
            "elementOpen(\"p\")",
            "  text(\"one \\",
            "two\")",
            "elementClose(\"p\")",
        ]
    );
}

#[test]
fn test_template_metadata() {
    let compiled = compile("<template name=\"card\" args=\"item, index\"><p>{item}</p></template>");

    assert_eq!(compiled.program.signature.to_string(), "card (item, index)");
    assert_eq!(
        compiled.program.body,
        vec![
            "elementOpen(\"p\")",
            "  text(\"\" + (item))",
            "elementClose(\"p\")",
        ]
    );
    assert!(compiled.diagnostics.is_empty());
}

#[test]
fn test_metadata_overrides_caller_defaults() {
    let compiled = Compiler::new(Options {
        name: Some("fallback".to_string()),
        args: Some("state".to_string()),
        ..Options::default()
    })
    .compile("<template args=\"model\"></template>")
    .unwrap();

    assert_eq!(compiled.program.signature.to_string(), "fallback (model)");
}

#[test]
fn test_nested_template_is_rendered() {
    let compiled = compile("<div><template name=\"row\"></template></div>");

    assert!(
        compiled
            .program
            .body
            .contains(&"  elementOpen(\"template\", \"k1\", hoisted1)".to_string())
    );
    assert_eq!(compiled.program.signature.to_string(), "description (data)");
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::UnresolvedMetadata { .. }]
    ));
}

#[test]
fn test_invalid_function_name_falls_back() {
    let compiled = compile("<template name=\"my-card\" args=\"a b\"></template>");

    assert_eq!(compiled.program.signature.to_string(), "description (a, b)");
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::UnresolvedMetadata { reason, .. }] if reason.contains("my-card")
    ));
}

#[test]
fn test_scripts() {
    let compiled = compile(
        "<script hoisted>\n  var helpers = {}\n</script><script>var local = 1</script><p></p>",
    );

    assert_eq!(compiled.program.prologue, "var helpers = {}");
    assert_eq!(
        compiled.program.body,
        vec!["var local = 1", "elementOpen(\"p\")", "elementClose(\"p\")"]
    );
}

#[test]
fn test_typed_script_is_an_element() {
    assert_eq!(
        body("<script type=\"text/x\">{a}</script>"),
        vec![
            "elementOpen(\"script\", \"k1\", hoisted1)",
            "  text(\"\" + (a))",
            "elementClose(\"script\")",
        ]
    );
}

#[test]
fn test_skip_tag() {
    assert_eq!(
        body("<div><skip condition=\"locked\"><p>x</p></skip></div>"),
        vec![
            "elementOpen(\"div\")",
            "  if (locked) {",
            "    skip()",
            "  } else {",
            "    elementOpen(\"p\")",
            "      text(\"x\")",
            "    elementClose(\"p\")",
            "  }",
            "elementClose(\"div\")",
        ]
    );
}

#[test]
fn test_empty_skip_attribute_always_skips() {
    assert_eq!(
        body("<div skip></div>"),
        vec![
            "elementOpen(\"div\")",
            "  if (true) {",
            "    skip()",
            "  } else {",
            "  }",
            "elementClose(\"div\")",
        ]
    );
}

#[test]
fn test_unbalanced_elements_are_closed() {
    let compiled = compile("</span><div><p>text</div><section>");

    assert_eq!(
        compiled.program.body,
        vec![
            "elementOpen(\"div\")",
            "  elementOpen(\"p\")",
            "    text(\"text\")",
            "  elementClose(\"p\")",
            "elementClose(\"div\")",
            "elementOpen(\"section\")",
            "elementClose(\"section\")",
        ]
    );
    assert_eq!(
        compiled
            .diagnostics
            .iter()
            .map(|d| match d {
                CompileError::UnbalancedElement { name, reason, .. } => (name.clone(), *reason),
                other => panic!("unexpected diagnostic {:?}", other),
            })
            .collect::<Vec<_>>(),
        vec![
            (SmolStr::new("span"), "closed without being opened"),
            (SmolStr::new("p"), "closed implicitly by an enclosing end tag"),
            (SmolStr::new("section"), "never closed"),
        ]
    );
}

#[test]
fn test_unclosed_directives_stay_balanced() {
    assert_eq!(
        body("<if condition=\"a\"><each expression=\"x in xs\"><skip>"),
        vec![
            "if (a) {",
            "  var __target1 = xs",
            "  if (__target1 != null) {",
            "    ;(__target1.forEach ? __target1 : Object.keys(__target1)).forEach(function ($value, $item) {",
            "      if (!__target1.forEach) { $item = $value; $value = __target1[$item] }",
            "      var x = $value",
            "      var $key1 = $item + \"_k1\"",
            "      if (true) {",
            "        skip()",
            "      } else {",
            "      }",
            "    }, this)",
            "  }",
            "}",
        ]
    );
}

#[test]
fn test_chaining_attributes_are_reported() {
    let compiled = compile("<p elseif=\"x\"></p>");

    assert_eq!(
        compiled.program.body,
        vec!["elementOpen(\"p\")", "elementClose(\"p\")"]
    );
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::UnmatchedDirective { directive, .. }] if directive == "elseif"
    ));
}

#[rstest]
#[case::attribute("<li each=\"items\"></li>", vec!["elementOpen(\"li\")", "elementClose(\"li\")"])]
#[case::tag("<each expression=\"nope\"><p></p></each>", vec!["elementOpen(\"p\")", "elementClose(\"p\")"])]
fn test_invalid_iteration(#[case] source: &str, #[case] expected: Vec<&str>) {
    let compiled = compile(source);

    assert_eq!(compiled.program.body, expected);
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::InvalidIteration { .. }]
    ));
}

#[test]
fn test_nested_braces_in_text_are_reported() {
    let compiled = compile("<p>{a {b}}</p>");

    assert!(!compiled.diagnostics.is_empty());
    assert!(
        compiled
            .diagnostics
            .iter()
            .all(|d| matches!(d, CompileError::UnsupportedInterpolation { .. }))
    );
}

#[test]
fn test_less_than_in_text_expression() {
    let compiled = compile("<p>{a < b ? 1 : 2}</p>");

    assert!(compiled.diagnostics.is_empty(), "{:?}", compiled.diagnostics);
    assert_eq!(
        compiled.program.body,
        vec![
            "elementOpen(\"p\")",
            "  text(\"\" + (a < b ? 1 : 2))",
            "elementClose(\"p\")",
        ]
    );
}

#[rstest]
#[case::property(
    "<input value=\"{}\">",
    vec!["elementOpen(\"input\", null, null, \"value\", \"\")", "elementClose(\"input\")"],
    "attribute `value`"
)]
#[case::if_attribute(
    "<p if=\"{}\">x</p>",
    vec!["if (true) {", "  elementOpen(\"p\")", "    text(\"x\")", "  elementClose(\"p\")", "}"],
    "`if` condition"
)]
#[case::if_tag(
    "<if condition=\"{ }\"><p></p></if>",
    vec!["if (true) {", "  elementOpen(\"p\")", "  elementClose(\"p\")", "}"],
    "`if` condition"
)]
#[case::text(
    "<p>a {} b</p>",
    vec!["elementOpen(\"p\")", "  text(\"a \" + \" b\")", "elementClose(\"p\")"],
    "text"
)]
fn test_empty_expressions_are_reported(
    #[case] source: &str,
    #[case] expected: Vec<&str>,
    #[case] expected_context: &str,
) {
    let compiled = compile(source);

    assert_eq!(compiled.program.body, expected);
    assert!(matches!(
        compiled.diagnostics.as_slice(),
        [CompileError::UnsupportedInterpolation { context, reason, .. }]
            if context == expected_context && *reason == "`{}` holds no expression"
    ));
}

#[test]
fn test_strict_mode_fails_on_diagnostics() {
    let compiler = Compiler::new(Options {
        strict: true,
        ..Options::default()
    });

    let error = compiler.compile("<else></else>").unwrap_err();

    assert!(matches!(
        error.cause,
        InnerError::Compile(CompileError::UnmatchedDirective { .. })
    ));
    assert!(compiler.compile("<p></p>").is_ok());
}

#[test]
fn test_tokenize_errors_fail() {
    let error = Compiler::default().compile("<script>var a").unwrap_err();

    assert!(matches!(error.cause, InnerError::Tokenize(_)));
}

#[test]
fn test_compile_is_deterministic() {
    let source = "<ul><li each=\"item in items\" class=\"row\">{item}</li></ul><p class=\"x\"></p>";

    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_custom_id_source() {
    let mut ids = || SmolStr::new("fixed");
    let compiled = Compiler::default()
        .compile_with("<div class=\"a\"></div>", &mut ids)
        .unwrap();

    assert_eq!(
        compiled.program.body[0],
        "elementOpen(\"div\", \"fixed\", hoisted1)"
    );
}

#[test]
fn test_key_prefix() {
    let compiled = Compiler::new(Options {
        key_prefix: "card".to_string(),
        ..Options::default()
    })
    .compile("<li each=\"x in xs\" class=\"c\"></li><p class=\"c\"></p>")
    .unwrap();

    assert!(
        compiled
            .program
            .body
            .contains(&"    var $key1 = $item + \"_card1\"".to_string())
    );
    assert!(
        compiled
            .program
            .body
            .contains(&"elementOpen(\"p\", \"card2\", hoisted1)".to_string())
    );
}

#[test]
fn test_packaged_code() {
    let compiled = Compiler::new(Options {
        mode: OutputMode::Es6,
        ..Options::default()
    })
    .compile("<template name=\"hello\"><p class=\"greeting\">Hello {name}!</p></template>")
    .unwrap();

    assert_eq!(
        compiled.code,
        "import {patch, elementOpen, elementClose, text, skip, currentElement} from \"incremental-dom\"

var hoisted1 = [\"class\", \"greeting\"]

export function hello (data) {
  elementOpen(\"p\", \"k1\", hoisted1)
    text(\"Hello \" + (name) + \"!\")
  elementClose(\"p\")
}
"
    );
}

#[test]
fn test_errors_point_into_source() {
    let source = "<p elseif=\"x\"></p>";
    let compiled = compile(source);
    let errors = compiled.errors(source).collect::<Vec<_>>();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location.offset(), 0);
    assert_eq!(errors[0].source_code, source);
}
