use anyhow::{bail, Context};
use bytes::Buf;

/// Partitions handed to one group member by the `consumer` protocol assignor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedPartitions {
    pub topic: String,
    pub partitions: Vec<i32>,
}

/// Decodes the `ConsumerProtocolAssignment` blob returned by DescribeGroups.
///
/// Layout: version (i16), topics array (i32 count; each topic is an i16-prefixed string
/// followed by an i32-counted array of i32 partitions), then user data which is ignored.
pub fn decode_member_assignment(data: &[u8]) -> Result<Vec<AssignedPartitions>, anyhow::Error> {
    let mut buf = data;
    if buf.is_empty() {
        return Ok(vec![]);
    }

    let _version = read_i16(&mut buf).context("While reading assignment version")?;
    let topics_count = read_i32(&mut buf).context("While reading topics count")?;

    let mut assignments = Vec::with_capacity(topics_count.max(0) as usize);
    for _ in 0..topics_count.max(0) {
        let topic = read_string(&mut buf).context("While reading topic name")?;
        let partitions_count =
            read_i32(&mut buf).with_context(|| format!("While reading partitions of {}", topic))?;

        let mut partitions = Vec::with_capacity(partitions_count.max(0) as usize);
        for _ in 0..partitions_count.max(0) {
            partitions.push(read_i32(&mut buf)?);
        }

        assignments.push(AssignedPartitions { topic, partitions });
    }

    Ok(assignments)
}

fn read_i16(buf: &mut &[u8]) -> Result<i16, anyhow::Error> {
    if buf.remaining() < 2 {
        bail!("Unexpected end of assignment, need 2 bytes, got {}", buf.remaining())
    }
    Ok(buf.get_i16())
}

fn read_i32(buf: &mut &[u8]) -> Result<i32, anyhow::Error> {
    if buf.remaining() < 4 {
        bail!("Unexpected end of assignment, need 4 bytes, got {}", buf.remaining())
    }
    Ok(buf.get_i32())
}

fn read_string(buf: &mut &[u8]) -> Result<String, anyhow::Error> {
    let len = read_i16(buf)?;
    if len < 0 {
        bail!("Null topic name in assignment")
    }
    let len = len as usize;
    if buf.remaining() < len {
        bail!("Unexpected end of assignment, need {} bytes, got {}", len, buf.remaining())
    }
    let value = String::from_utf8(buf[..len].to_vec()).context("Topic name isn't utf-8")?;
    buf.advance(len);

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    fn encode(assignments: &[(&str, &[i32])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_i16(0);
        buf.put_i32(assignments.len() as i32);
        for (topic, partitions) in assignments {
            buf.put_i16(topic.len() as i16);
            buf.put_slice(topic.as_bytes());
            buf.put_i32(partitions.len() as i32);
            for partition in partitions.iter() {
                buf.put_i32(*partition);
            }
        }
        // user data
        buf.put_i32(-1);
        buf
    }

    #[test]
    fn decodes_topics_and_partitions() {
        let data = encode(&[("orders", &[0, 2]), ("payments", &[1])]);

        let decoded = decode_member_assignment(&data).unwrap();

        assert_eq!(
            decoded,
            vec![
                AssignedPartitions {
                    topic: "orders".to_owned(),
                    partitions: vec![0, 2],
                },
                AssignedPartitions {
                    topic: "payments".to_owned(),
                    partitions: vec![1],
                },
            ]
        );
    }

    #[test]
    fn empty_assignment_has_no_partitions() {
        assert!(decode_member_assignment(&[]).unwrap().is_empty());
    }

    #[test]
    fn truncated_assignment_is_an_error() {
        let data = encode(&[("orders", &[0, 2])]);

        assert!(decode_member_assignment(&data[..12]).is_err());
    }
}
