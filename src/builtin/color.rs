//! Color builtins : `rgba`, `lighten`, `darken`,
//! `mix`, `adjust-hue`, `saturate`, `desaturate`, `opacify`,
//! `transparentize`, `red`/`green`/`blue`/`alpha`.

use std::collections::HashMap;

use codemap::Span;
use num_rational::Rational64;
use num_traits::ToPrimitive;

use crate::ast::expression::{Expression, SassColor};
use crate::environment::Environment;
use crate::error::SassResult;

use super::{optional, required, Builtin};

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    m.insert(
        "rgba",
        Builtin::new(
            vec![
                required("red"),
                required("green"),
                required("blue"),
                optional("alpha", Expression::number(Rational64::from_integer(1))),
            ],
            rgba,
        ),
    );
    m.insert(
        "lighten",
        Builtin::new(vec![required("color"), required("amount")], lighten),
    );
    m.insert(
        "darken",
        Builtin::new(vec![required("color"), required("amount")], darken),
    );
    m.insert(
        "saturate",
        Builtin::new(vec![required("color"), required("amount")], saturate),
    );
    m.insert(
        "desaturate",
        Builtin::new(vec![required("color"), required("amount")], desaturate),
    );
    m.insert(
        "adjust-hue",
        Builtin::new(vec![required("color"), required("degrees")], adjust_hue),
    );
    m.insert(
        "opacify",
        Builtin::new(vec![required("color"), required("amount")], opacify),
    );
    m.insert(
        "transparentize",
        Builtin::new(vec![required("color"), required("amount")], transparentize),
    );
    m.insert(
        "mix",
        Builtin::new(
            vec![
                required("color1"),
                required("color2"),
                optional("weight", Expression::number_with_unit(Rational64::from_integer(50), "%")),
            ],
            mix,
        ),
    );
    m.insert("red", Builtin::new(vec![required("color")], red));
    m.insert("green", Builtin::new(vec![required("color")], green));
    m.insert("blue", Builtin::new(vec![required("color")], blue));
    m.insert("alpha", Builtin::new(vec![required("color")], alpha));
}

fn expect_color(value: &Expression, span: Span) -> SassResult<SassColor> {
    match value {
        Expression::Color(c) => Ok(c.clone()),
        other => Err((format!("{:?} is not a color.", other), span).into()),
    }
}

fn channel(arg: &Expression, span: Span) -> SassResult<u8> {
    let (v, ..) = expect_number(arg, span)?;
    let rounded = v.round().to_integer();
    Ok(rounded.clamp(0, 255) as u8)
}

fn expect_number(arg: &Expression, span: Span) -> SassResult<(Rational64, Vec<String>, Vec<String>)> {
    super::expect_number(arg, span)
}

fn rgba(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let r = channel(&args[0], span)?;
    let g = channel(&args[1], span)?;
    let b = channel(&args[2], span)?;
    let (a, ..) = expect_number(&args[3], span)?;
    Ok(Expression::Color(SassColor::rgba(r, g, b, clamp01(a))))
}

fn clamp01(v: Rational64) -> Rational64 {
    let zero = Rational64::from_integer(0);
    let one = Rational64::from_integer(1);
    if v < zero {
        zero
    } else if v > one {
        one
    } else {
        v
    }
}

fn rgb_to_hsl(c: &SassColor) -> (f64, f64, f64) {
    let r = f64::from(c.r) / 255.0;
    let g = f64::from(c.g) / 255.0;
    let b = f64::from(c.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if (max - r).abs() < f64::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h * 60.0, s, l)
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let mut t = t;
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn hsl_to_rgb(h: f64, s: f64, l: f64, a: Rational64) -> SassColor {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return SassColor::rgba(v, v, v, a);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h / 360.0;
    let r = (hue_to_rgb(p, q, h + 1.0 / 3.0) * 255.0).round() as u8;
    let g = (hue_to_rgb(p, q, h) * 255.0).round() as u8;
    let b = (hue_to_rgb(p, q, h - 1.0 / 3.0) * 255.0).round() as u8;
    SassColor::rgba(r, g, b, a)
}

fn adjust_lightness(args: &[Expression], span: Span, sign: f64) -> SassResult<Expression> {
    let color = expect_color(&args[0], span)?;
    let (amount, ..) = expect_number(&args[1], span)?;
    let amount = amount.to_f64().unwrap_or(0.0) / 100.0;
    let (h, s, l) = rgb_to_hsl(&color);
    let l = (l + sign * amount).clamp(0.0, 1.0);
    Ok(Expression::Color(hsl_to_rgb(h, s, l, color.a)))
}

fn lighten(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    adjust_lightness(args, span, 1.0)
}

fn darken(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    adjust_lightness(args, span, -1.0)
}

fn adjust_saturation(args: &[Expression], span: Span, sign: f64) -> SassResult<Expression> {
    let color = expect_color(&args[0], span)?;
    let (amount, ..) = expect_number(&args[1], span)?;
    let amount = amount.to_f64().unwrap_or(0.0) / 100.0;
    let (h, s, l) = rgb_to_hsl(&color);
    let s = (s + sign * amount).clamp(0.0, 1.0);
    Ok(Expression::Color(hsl_to_rgb(h, s, l, color.a)))
}

fn saturate(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    adjust_saturation(args, span, 1.0)
}

fn desaturate(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    adjust_saturation(args, span, -1.0)
}

fn adjust_hue(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let color = expect_color(&args[0], span)?;
    let (degrees, ..) = expect_number(&args[1], span)?;
    let (h, s, l) = rgb_to_hsl(&color);
    let h = (h + degrees.to_f64().unwrap_or(0.0)).rem_euclid(360.0);
    Ok(Expression::Color(hsl_to_rgb(h, s, l, color.a)))
}

fn adjust_alpha(args: &[Expression], span: Span, sign: f64) -> SassResult<Expression> {
    let color = expect_color(&args[0], span)?;
    let (amount, ..) = expect_number(&args[1], span)?;
    let amount = amount.to_f64().unwrap_or(0.0);
    let current = color.a.to_f64().unwrap_or(1.0);
    let new_alpha = (current + sign * amount).clamp(0.0, 1.0);
    Ok(Expression::Color(SassColor::rgba(
        color.r,
        color.g,
        color.b,
        Rational64::approximate_float(new_alpha).unwrap_or(color.a),
    )))
}

fn opacify(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    adjust_alpha(args, span, 1.0)
}

fn transparentize(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    adjust_alpha(args, span, -1.0)
}

/// Weighted average of two colors (the classic Sass `mix()` algorithm,
/// accounting for alpha so a fully transparent color doesn't pull the
/// result toward black).
fn mix(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    let c1 = expect_color(&args[0], span)?;
    let c2 = expect_color(&args[1], span)?;
    let (weight_num, ..) = expect_number(&args[2], span)?;
    let weight = weight_num.to_f64().unwrap_or(50.0) / 100.0;
    let a1 = c1.a.to_f64().unwrap_or(1.0);
    let a2 = c2.a.to_f64().unwrap_or(1.0);
    let alpha_diff = a1 - a2;
    let w = 2.0 * weight - 1.0;
    let combined = if (w * alpha_diff).abs() >= 1.0 { w } else { (w + alpha_diff) / (1.0 + w * alpha_diff) };
    let w1 = (combined + 1.0) / 2.0;
    let w2 = 1.0 - w1;
    let mix_channel = |a: u8, b: u8| -> u8 { (f64::from(a) * w1 + f64::from(b) * w2).round() as u8 };
    let new_alpha = a1 * weight + a2 * (1.0 - weight);
    Ok(Expression::Color(SassColor::rgba(
        mix_channel(c1.r, c2.r),
        mix_channel(c1.g, c2.g),
        mix_channel(c1.b, c2.b),
        Rational64::approximate_float(new_alpha).unwrap_or(clamp01(c1.a)),
    )))
}

fn red(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    Ok(Expression::number(Rational64::from_integer(expect_color(&args[0], span)?.r as i64)))
}

fn green(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    Ok(Expression::number(Rational64::from_integer(expect_color(&args[0], span)?.g as i64)))
}

fn blue(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    Ok(Expression::number(Rational64::from_integer(expect_color(&args[0], span)?.b as i64)))
}

fn alpha(args: &[Expression], _: &Environment, span: Span) -> SassResult<Expression> {
    Ok(Expression::number(expect_color(&args[0], span)?.a))
}
