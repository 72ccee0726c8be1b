fn main() {
    interview_prep_lib::run()
}
