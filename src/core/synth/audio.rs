impl super::Synth {
    /// Generate one mono sample and advance the audio clock
    pub fn next_sample(&mut self) -> f32 {
        let clock = self.clock;
        let sample_rate = self.sample_rate;

        let mut sample = 0.0;
        for voice in self.voices.iter_mut() {
            sample += voice.next_sample(clock, sample_rate);
        }

        // Drop voices whose release has run out
        self.voices.retain(|v| !v.is_finished(clock, sample_rate));
        self.clock += 1;

        (sample * self.master_gain).clamp(-1.0, 1.0)
    }

    /// Fill a mono buffer
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
