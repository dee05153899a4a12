/// Processing level determination for hierarchical log output

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingLevel {
    Root,   // Top level operations
    Stage,  // Major processing stages
    Step,   // Individual steps within stages
    Detail, // Detailed information
}

/// Determines the processing level of a log message based on its content
pub fn determine_processing_level(message: &str) -> ProcessingLevel {
    // Root level - main operations
    if message.contains("Processing file")
        || (message.contains("Found") && message.contains("file(s) to process"))
        || message.contains("Batch finished")
    {
        return ProcessingLevel::Root;
    }

    // Stage level - detection start and results
    if message.starts_with("Starting") && message.contains("detection") {
        return ProcessingLevel::Stage;
    }

    if message.contains("Detection completed")
        || message.contains("hard-cut insertion point(s)")
        || message.contains("Profile selected")
    {
        return ProcessingLevel::Stage;
    }

    // Step level - backend runs and report handling
    if message.starts_with("Running")
        && (message.contains("silence analysis")
            || message.contains("black analysis")
            || message.contains("frame analysis")
            || message.contains("scene analysis"))
    {
        return ProcessingLevel::Step;
    }

    if message.starts_with("Reports parsed")
        || message.contains("Reading reports from")
        || message.contains("Getting media info")
        || message.contains("Media duration")
        || message.contains("container chapter mark(s)")
    {
        return ProcessingLevel::Step;
    }

    // Detail level - supporting information
    ProcessingLevel::Detail
}
