use vergen::EmitBuilder;

fn main() {
    EmitBuilder::builder()
        .build_timestamp() // outputs 'VERGEN_BUILD_TIMESTAMP'
        .git_sha(true) // outputs 'VERGEN_GIT_SHA', short form
        .emit()
        .expect("Unable to generate the cargo keys!");
}
