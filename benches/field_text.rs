use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use datafile::field_text::{parse_field_line, title_to_field};

const LINES: [&str; 5] = [
    "This is just a title",
    "\tHave you ever kept, or cared for, birds including caged birds or racing birds?* $ever_kept_birds :yes_no {condition_test=Y,condition_action=show,condition_target=bird_description}",
    r#""Enter the prices [in $]" $price_entry :number {prefix=£}"#,
    "\t\t* @iswt1_distance_prac $iswt_distance_prac :number {size=6,suffix=m,min=0,max=1200}",
    "   <p>Whatever</p>",
];

fn bench_parse_field_line(c: &mut Criterion) {
    c.bench_function("parse_field_line/mixed", |b| {
        b.iter(|| {
            for line in LINES {
                black_box(parse_field_line(black_box(line)).expect("valid line"));
            }
        })
    });

    c.bench_function("title_to_field/long_title", |b| {
        b.iter(|| {
            title_to_field(black_box(
                "<b>Have you ever kept, or cared for, birds including caged birds?</b>",
            ))
        })
    });
}

criterion_group!(benches, bench_parse_field_line);
criterion_main!(benches);
