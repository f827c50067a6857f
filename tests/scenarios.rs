#![cfg(test)]

#[macro_use]
mod macros;

// S1: a later `!default` assignment never overrides an already-bound value.
test!(
    default_assignment_does_not_override,
    "$c: red; $c: blue !default; .a { color: $c; }\n",
    ".a {\n  color: red;\n}\n"
);

// S2: nesting plus a parent-selector reference expand to the flat
// descendant/compound forms.
test!(
    nesting_and_parent_ref,
    ".a { .b { color: red; } &:hover { color: blue; } }\n",
    ".a .b {\n  color: red;\n}\n\n.a:hover {\n  color: blue;\n}\n"
);

// S3: a mixin parameter's default is used unless the call site supplies
// its own positional argument.
test!(
    mixin_default_parameter,
    "@mixin m($p: 10px) { padding: $p; } .a { @include m; } .b { @include m(20px); }\n",
    ".a {\n  padding: 10px;\n}\n\n.b {\n  padding: 20px;\n}\n"
);

// S4: `@extend` adds the extending selector to the extended rule's
// selector list, in source order, while leaving the extending
// ruleset's own declarations in their own rule.
test!(
    extend_adds_to_selector_list,
    ".a { color: red; } .b { @extend .a; font: bold; }\n",
    ".a, .b {\n  color: red;\n}\n\n.b {\n  font: bold;\n}\n"
);

// S5: extending a placeholder selector pulls in its declarations but
// the placeholder rule itself is never emitted.
test!(
    placeholder_extend_is_not_emitted,
    "%p { color: red; } .a { @extend %p; }\n",
    ".a {\n  color: red;\n}\n"
);

// S6: a `@media` rule nested inside another `@media` rule bubbles out
// and merges its query with the enclosing one via `and`.
test!(
    media_bubble_and_merge,
    "@media screen { .a { @media (min-width: 100px) { color: red; } } }\n",
    "@media screen and (min-width: 100px) {\n  .a {\n    color: red;\n  }\n}\n"
);

// Testable property 1: a lexical (non-`!global`) assignment inside a
// mixin body does not leak out to the caller's binding.
test!(
    mixin_assignment_does_not_leak_to_caller,
    "$x: 1; @mixin m { $x: 2; } a { @include m; b: $x; }\n",
    "a {\n  b: 1;\n}\n"
);

// Testable property 1 (global escape hatch): `!global` inside a mixin
// body does write through to the outer binding.
test!(
    mixin_global_assignment_leaks_to_caller,
    "$x: 1; @mixin m { $x: 2 !global; } a { @include m; } b { c: $x; }\n",
    "b {\n  c: 2;\n}\n"
);

// Testable property 2: a mixin's free variable resolves against its
// *definition* site, not whatever is bound at the call site.
test!(
    mixin_lexical_scope_uses_definition_site,
    ".outer { $x: 1; @mixin m { y: $x; } .inner { $x: 2; @include m; } }\n",
    ".outer .inner {\n  y: 1;\n}\n"
);

// Testable property 3 (associativity of parent resolution): nesting
// three rulesets produces the same selector as writing the compound
// descendant selector directly.
test!(
    nested_rulesets_equal_flat_descendant_selector,
    "a { b { c { color: red; } } }\n",
    "a b c {\n  color: red;\n}\n"
);

test!(
    flat_descendant_selector_reference,
    "a b c { color: red; }\n",
    "a b c {\n  color: red;\n}\n"
);

// Cssize flatness + property composition: a declaration with a nested
// sub-block composes `outer-inner` property names, and a rule nested
// inside another rule is bubbled to sibling position rather than
// staying nested.
test!(
    declaration_block_composes_property_names,
    ".a { font: { family: sans-serif; size: 10px; } }\n",
    ".a {\n  font-family: sans-serif;\n  font-size: 10px;\n}\n"
);

// `@each` over a list destructures one variable per item and restores
// the pre-loop binding of the loop variable afterward.
test!(
    each_over_list_binds_single_variable,
    "$out: \"\"; @each $i in 1, 2, 3 { $out: $i; } a { b: $out; }\n",
    "a {\n  b: 3;\n}\n"
);

// `@for` is inclusive when written `through` and exclusive when
// written `to`.
test!(
    for_through_is_inclusive,
    "$n: 0; @for $i from 1 through 3 { $n: $i; } a { b: $n; }\n",
    "a {\n  b: 3;\n}\n"
);

test!(
    for_to_is_exclusive,
    "$n: 0; @for $i from 1 to 3 { $n: $i; } a { b: $n; }\n",
    "a {\n  b: 2;\n}\n"
);

// Arithmetic round-trip (testable property 7), restated as a compile
// scenario rather than raw unit arithmetic.
test!(
    number_arithmetic_round_trips,
    "a { b: (1px + 2px) - 2px; }\n",
    "a {\n  b: 1px;\n}\n"
);

// Interpolation fidelity (testable property 8): interpolating a value
// into an otherwise-empty unquoted schema reproduces its unquoted text.
test!(
    interpolation_of_number_is_unquoted_text,
    "$x: 10px; a { b: #{$x}; }\n",
    "a {\n  b: 10px;\n}\n"
);

test!(
    interpolation_of_null_is_empty,
    "a { b: foo#{null}bar; }\n",
    "a {\n  b: foobar;\n}\n"
);

// An unresolved, unknown function name passes through as a literal
// CSS function call (resolution order, case 3).
test!(
    unknown_function_passes_through,
    "a { b: rotate(45deg); }\n",
    "a {\n  b: rotate(45deg);\n}\n"
);

error!(
    undefined_variable_is_an_evaluation_error,
    "a { b: $nope; }\n",
    "Error: Undefined variable: \"$nope\"."
);

error!(
    incompatible_units_cannot_be_added,
    "a { b: 1px + 1s; }\n",
    "Error: Incompatible units px and s."
);
